//! One staffing configuration, run for a fixed number of minutes

use std::num::NonZeroUsize;

use des::{Agent, AgentId, EventLoop};
use tracing::{debug, debug_span};

use crate::arrivals::{ArrivalPolicy, ArrivalProcess, ArrivalStats};
use crate::customer::CustomerStats;
use crate::resource::{PoolStats, ResourcePool};
use crate::samplers::{PositiveNormal, ServiceParams, ServiceTimes};
use crate::wait_log::{WaitTimeLog, WaitTimeRecorder};
use crate::{Event, Floor, Staffing, Station, Stats, TheaterError};

// Agents registered before any moviegoer, in this order
const FLOOR: Floor = Floor {
    cashiers: AgentId(0),
    ushers: AgentId(1),
    food_servers: AgentId(2),
    recorder: AgentId(3),
};
const ARRIVALS: AgentId = AgentId(4);

/// A validated staffing configuration and seed, ready to run.
///
/// Every call to [`Simulation::run`] starts from an empty theater and a
/// freshly seeded random stream, so the same handle and horizon always give
/// the same wait times.
#[derive(Debug, Clone)]
pub struct Simulation {
    staffing: Staffing,
    capacities: [(Station, NonZeroUsize); 3],
    seed: u64,
    service_times: ServiceTimes,
    arrival_interval: PositiveNormal,
    policy: ArrivalPolicy,
}

impl Simulation {
    /// Fails with [`TheaterError::ZeroCapacity`] if any station is unstaffed
    pub fn new(staffing: Staffing, seed: u64) -> Result<Self, TheaterError> {
        let capacities = [
            (Station::Cashier, staffing.nonzero_capacity(Station::Cashier)?),
            (Station::Usher, staffing.nonzero_capacity(Station::Usher)?),
            (Station::FoodServer, staffing.nonzero_capacity(Station::FoodServer)?),
        ];
        let params = ServiceParams::default();
        Ok(Simulation {
            staffing,
            capacities,
            seed,
            service_times: params.service_times()?,
            arrival_interval: params.arrival_interval()?,
            policy: ArrivalPolicy::default(),
        })
    }

    pub fn with_params(mut self, params: ServiceParams) -> Result<Self, TheaterError> {
        self.service_times = params.service_times()?;
        self.arrival_interval = params.arrival_interval()?;
        Ok(self)
    }

    pub fn with_arrival_policy(mut self, policy: ArrivalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn staffing(&self) -> Staffing {
        self.staffing
    }

    /// Fresh event loop: three pools, the recorder and the arrival process,
    /// with the arrival process due to start at t = 0
    pub fn event_loop(&self) -> EventLoop<Event, Stats> {
        let mut agents: Vec<Box<dyn Agent<Event, Stats>>> = Vec::with_capacity(5);
        for (station, capacity) in self.capacities {
            agents.push(Box::new(ResourcePool::new(station, capacity)));
        }
        agents.push(Box::new(WaitTimeRecorder::new()));
        agents.push(Box::new(ArrivalProcess::new(
            FLOOR,
            self.arrival_interval,
            self.service_times.clone(),
            self.policy,
            self.seed,
        )));

        EventLoop::new(vec![(0.0, ARRIVALS, Event::Start)], agents)
    }

    /// Wait times of every moviegoer seated within `horizon` minutes
    pub fn run(&self, horizon: f64) -> Result<WaitTimeLog, TheaterError> {
        Ok(self.run_detailed(horizon)?.wait_times)
    }

    /// Like [`Simulation::run`], keeping the stats of every agent
    pub fn run_detailed(&self, horizon: f64) -> Result<RunReport, TheaterError> {
        let horizon = check_horizon(horizon)?;
        let _span = debug_span!("run", staffing = %self.staffing, seed = self.seed).entered();

        let mut event_loop = self.event_loop();
        event_loop.run(horizon);
        debug!(
            delivered = event_loop.delivered(),
            abandoned = event_loop.pending(),
            agents = event_loop.agent_count(),
            "horizon reached"
        );

        let report = RunReport::from_stats(self.staffing, horizon, event_loop.stats());
        for pool in &report.pools {
            debug!(
                station = %pool.station,
                peak_held = pool.peak_held,
                utilization = pool.utilization(),
                mean_queue_delay = pool.mean_queue_delay(),
                "pool at horizon"
            );
        }
        Ok(report)
    }

    /// The recorder's log in an event loop built by [`Simulation::event_loop`]
    pub fn wait_times(event_loop: &EventLoop<Event, Stats>) -> WaitTimeLog {
        match event_loop.agent_stats(FLOOR.recorder) {
            Some(Stats::WaitTimes(log)) => log,
            _ => WaitTimeLog::new(),
        }
    }
}

pub(crate) fn check_horizon(horizon: f64) -> Result<f64, TheaterError> {
    if horizon.is_finite() && horizon > 0.0 {
        Ok(horizon)
    } else {
        Err(TheaterError::InvalidHorizon(horizon))
    }
}

/// Everything observable at the end of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub staffing: Staffing,
    pub horizon: f64,
    pub wait_times: WaitTimeLog,
    /// In station order: cashiers, ushers, food servers
    pub pools: Vec<PoolStats>,
    /// In arrival order
    pub customers: Vec<CustomerStats>,
    pub arrivals: Option<ArrivalStats>,
}

impl RunReport {
    pub fn from_stats(staffing: Staffing, horizon: f64, stats: Vec<Stats>) -> Self {
        let mut report = RunReport {
            staffing,
            horizon,
            wait_times: WaitTimeLog::new(),
            pools: Vec::new(),
            customers: Vec::new(),
            arrivals: None,
        };
        for stat in stats {
            match stat {
                Stats::Pool(pool) => report.pools.push(pool),
                Stats::Customer(customer) => report.customers.push(customer),
                Stats::Arrivals(arrivals) => report.arrivals = Some(arrivals),
                Stats::WaitTimes(log) => report.wait_times = log,
            }
        }
        report
    }

    pub fn pool(&self, station: Station) -> Option<&PoolStats> {
        self.pools.iter().find(|p| p.station == station)
    }

    pub fn seated(&self) -> impl Iterator<Item = &CustomerStats> {
        self.customers.iter().filter(|c| c.is_seated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstaffed_station_rejected() {
        let staffing = Staffing {
            cashiers: 1,
            ushers: 0,
            food_servers: 1,
        };

        assert!(matches!(
            Simulation::new(staffing, 42),
            Err(TheaterError::ZeroCapacity {
                station: Station::Usher
            })
        ));
    }

    #[test]
    fn test_bad_horizon_rejected() {
        let sim = Simulation::new(Staffing::new(1, 1, 1).unwrap(), 42).unwrap();

        for horizon in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sim.run(horizon),
                Err(TheaterError::InvalidHorizon(_))
            ));
        }
    }

    #[test]
    fn test_event_loop_layout() {
        let sim = Simulation::new(Staffing::new(2, 3, 4).unwrap(), 1).unwrap();
        let event_loop = sim.event_loop();

        assert_eq!(event_loop.agent_count(), 5);
        assert_eq!(event_loop.pending(), 1);

        let report = RunReport::from_stats(sim.staffing(), 1.0, event_loop.stats());
        let capacities: Vec<usize> = report.pools.iter().map(|p| p.capacity).collect();
        assert_eq!(capacities, vec![2, 3, 4]);
        assert_eq!(report.pool(Station::Usher).map(|p| p.capacity), Some(3));
        assert!(report.customers.is_empty());
        assert!(report.wait_times.is_empty());
    }

    #[test]
    fn test_short_horizon_seats_nobody() {
        // the first ticket sale alone takes at least a minute
        let sim = Simulation::new(Staffing::new(1, 1, 1).unwrap(), 42).unwrap();

        let log = sim.run(0.5).unwrap();

        assert!(log.is_empty());
        assert_eq!(log.mean(), None);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let sim = Simulation::new(Staffing::new(1, 1, 1).unwrap(), 42).unwrap();
        let params = ServiceParams {
            arrival_interval_mean: -1.0,
            ..ServiceParams::default()
        };

        assert!(matches!(
            sim.with_params(params),
            Err(TheaterError::InvalidDistribution {
                name: "arrival interval",
                ..
            })
        ));
    }
}
