use des::{Agent, AgentId, Response};
use serde::Serialize;

use crate::{Event, Stats};

/// Arrival-to-seat times of every seated moviegoer, in the order they sat down
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaitTimeLog {
    samples: Vec<f64>,
}

impl WaitTimeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, wait: f64) {
        self.samples.push(wait);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean wait, `None` when nobody was seated
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// Collects `Seated` notifications into the run's wait-time log
#[derive(Default)]
pub struct WaitTimeRecorder {
    log: WaitTimeLog,
}

impl WaitTimeRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Agent<Event, Stats> for WaitTimeRecorder {
    fn act(&mut self, _me: AgentId, _current_t: f64, data: &Event) -> Response<Event, Stats> {
        if let Event::Seated { wait, .. } = data {
            self.log.record(*wait);
        }
        Response::new()
    }

    fn stats(&self) -> Stats {
        Stats::WaitTimes(self.log.clone())
    }
}
