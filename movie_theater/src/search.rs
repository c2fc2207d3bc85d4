//! Exhaustive search over staffing configurations
//!
//! Every staffing within the headcount budget is simulated once, all with the
//! same seed, so each configuration faces the same stream of moviegoers.

use std::fs;
use std::path::Path;

use des::parallel::{ParallelRunner, simple_progress_reporter};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::simulation::{Simulation, check_horizon};
use crate::{Staffing, TheaterError, WaitTimeLog};

/// Result of simulating one staffing configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigResult {
    pub staffing: Staffing,
    pub seated: usize,
    /// `None` when nobody was seated before the horizon
    pub mean_wait: Option<f64>,
}

/// A configuration whose run panicked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedRun {
    pub staffing: Staffing,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub seed: u64,
    pub horizon: f64,
    /// In enumeration order
    pub results: Vec<ConfigResult>,
    pub failed: Vec<FailedRun>,
    pub best: Option<ConfigResult>,
    /// Wait times of the best configuration, in seating order
    pub best_wait_times: Vec<f64>,
}

impl SearchOutcome {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TheaterError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn consider(&mut self, staffing: Staffing, log: WaitTimeLog) {
        let result = ConfigResult {
            staffing,
            seated: log.len(),
            mean_wait: log.mean(),
        };
        let improves = match (result.mean_wait, self.best.as_ref().and_then(|b| b.mean_wait)) {
            (Some(candidate), Some(best)) => candidate < best,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if improves {
            self.best = Some(result.clone());
            self.best_wait_times = log.into_samples();
        }
        self.results.push(result);
    }
}

/// Run every staffing within `config.total_employees` and pick the one with
/// the lowest mean wait. Ties keep the configuration enumerated first.
pub fn search(config: &SearchConfig) -> Result<SearchOutcome, TheaterError> {
    let horizon = check_horizon(config.horizon)?;
    let simulations = Staffing::within_budget(config.total_employees)
        .into_iter()
        .map(|staffing| {
            Ok(Simulation::new(staffing, config.seed)?
                .with_params(config.service.clone())?
                .with_arrival_policy(config.arrival_policy))
        })
        .collect::<Result<Vec<_>, TheaterError>>()?;
    if simulations.is_empty() {
        return Err(TheaterError::EmptySearch {
            total: config.total_employees,
        });
    }
    info!(
        configurations = simulations.len(),
        total_employees = config.total_employees,
        horizon,
        seed = config.seed,
        "searching staffing configurations"
    );

    let progress_interval = (simulations.len() / 10).max(1);
    let mut runner = ParallelRunner::new(simulations.len(), |id| simulations[id].event_loop())
        .progress(simple_progress_reporter(progress_interval));
    if let Some(threads) = config.threads {
        runner = runner.num_threads(threads);
    }
    let logs = runner.run_with(horizon, Simulation::wait_times);

    let mut outcome = SearchOutcome {
        seed: config.seed,
        horizon,
        results: Vec::with_capacity(simulations.len()),
        failed: Vec::new(),
        best: None,
        best_wait_times: Vec::new(),
    };
    for (simulation, log) in simulations.iter().zip(logs) {
        let staffing = simulation.staffing();
        match log {
            Ok(log) => outcome.consider(staffing, log),
            Err(message) => {
                warn!(%staffing, %message, "simulation failed");
                outcome.failed.push(FailedRun { staffing, message });
            }
        }
    }

    match &outcome.best {
        Some(best) => info!(
            staffing = %best.staffing,
            mean_wait = best.mean_wait,
            seated = best.seated,
            "best configuration"
        ),
        None => warn!("no configuration seated anyone before the horizon"),
    }
    Ok(outcome)
}

/// Whole minutes and seconds of a duration given in minutes, rounded to the
/// nearest second
pub fn split_minutes(minutes: f64) -> (u64, u64) {
    let seconds = (minutes.max(0.0) * 60.0).round() as u64;
    (seconds / 60, seconds % 60)
}
