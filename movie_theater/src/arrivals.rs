use des::{Agent, AgentId, Response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::customer::Customer;
use crate::samplers::{PositiveNormal, ServiceTimes};
use crate::{Event, Floor, Stats};

/// How often the gap between arrivals is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalPolicy {
    /// One gap per run, reused for every arrival: moviegoers turn up
    /// periodically at a randomly chosen rate
    #[default]
    PerRun,
    /// A fresh gap before every arrival
    PerGap,
}

/// Statistics tracked by the arrival process
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalStats {
    pub policy: ArrivalPolicy,
    /// Most recently drawn gap between arrivals
    pub interval: Option<f64>,
    pub intervals_drawn: usize,
    pub spawned: usize,
}

/// Source of moviegoers.
///
/// Waits out the arrival gap, spawns the next moviegoer and goes back to
/// waiting, for as long as the event loop keeps running.
pub struct ArrivalProcess {
    floor: Floor,
    interval: PositiveNormal,
    service_times: ServiceTimes,
    policy: ArrivalPolicy,
    rng: StdRng,
    next_customer_id: usize,
    stats: ArrivalStats,
}

impl ArrivalProcess {
    pub fn new(
        floor: Floor,
        interval: PositiveNormal,
        service_times: ServiceTimes,
        policy: ArrivalPolicy,
        seed: u64,
    ) -> Self {
        ArrivalProcess {
            floor,
            interval,
            service_times,
            policy,
            rng: StdRng::seed_from_u64(seed),
            next_customer_id: 0,
            stats: ArrivalStats {
                policy,
                interval: None,
                intervals_drawn: 0,
                spawned: 0,
            },
        }
    }

    fn next_gap(&mut self) -> f64 {
        if let (ArrivalPolicy::PerRun, Some(interval)) = (self.policy, self.stats.interval) {
            return interval;
        }
        let interval = self.interval.sample(&mut self.rng);
        self.stats.interval = Some(interval);
        self.stats.intervals_drawn += 1;
        interval
    }

    fn spawn_customer(&mut self, current_t: f64, response: &mut Response<Event, Stats>) {
        let customer_id = self.next_customer_id;
        self.next_customer_id += 1;
        let seed = self.rng.random::<u64>();
        debug!(customer = customer_id, t = current_t, "moviegoer arrives");

        response.spawn(
            Box::new(Customer::new(
                customer_id,
                self.floor,
                self.service_times.clone(),
                seed,
            )),
            Event::Arrived,
        );
        self.stats.spawned += 1;
    }
}

impl Agent<Event, Stats> for ArrivalProcess {
    fn act(&mut self, me: AgentId, current_t: f64, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Start => {
                if self.stats.intervals_drawn > 0 {
                    return Response::new();
                }
                let gap = self.next_gap();
                Response::event(current_t + gap, me, Event::Arrival)
            }
            Event::Arrival => {
                let mut response = Response::new();
                self.spawn_customer(current_t, &mut response);
                let gap = self.next_gap();
                response.schedule(current_t + gap, me, Event::Arrival);
                response
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Arrivals(self.stats.clone())
    }
}
