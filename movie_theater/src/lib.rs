//! Movie theater queueing model
//!
//! Moviegoers arrive at a fixed (randomly chosen) interval, buy a ticket from
//! a cashier, have it checked by an usher and, half of the time, buy food from
//! a server before taking their seat. Each run of the model reports how long
//! every seated moviegoer spent between arriving and sitting down; the
//! [`search`] module runs the model over every staffing triple within a
//! headcount budget to find the one with the shortest mean wait.

use std::fmt;

use des::AgentId;
use serde::{Deserialize, Serialize};

pub mod arrivals;
pub mod config;
pub mod customer;
pub mod error;
pub mod logging;
pub mod resource;
pub mod samplers;
pub mod search;
pub mod simulation;
pub mod staffing;
pub mod wait_log;

pub use arrivals::{ArrivalPolicy, ArrivalProcess, ArrivalStats};
pub use config::SearchConfig;
pub use customer::{Customer, CustomerStats, StageRecord};
pub use error::TheaterError;
pub use resource::{Lease, PoolStats, ResourcePool};
pub use samplers::{PositiveNormal, ServiceParams, ServiceTimes};
pub use simulation::{RunReport, Simulation};
pub use staffing::Staffing;
pub use wait_log::{WaitTimeLog, WaitTimeRecorder};

/// A service point staffed by a pool of employees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    Cashier,
    Usher,
    FoodServer,
}

impl Station {
    /// Stations in itinerary order
    pub const ALL: [Station; 3] = [Station::Cashier, Station::Usher, Station::FoodServer];
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Station::Cashier => write!(f, "cashier"),
            Station::Usher => write!(f, "usher"),
            Station::FoodServer => write!(f, "food server"),
        }
    }
}

/// Handles of the long-lived agents every moviegoer talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Floor {
    pub cashiers: AgentId,
    pub ushers: AgentId,
    pub food_servers: AgentId,
    pub recorder: AgentId,
}

impl Floor {
    pub fn pool(&self, station: Station) -> AgentId {
        match station {
            Station::Cashier => self.cashiers,
            Station::Usher => self.ushers,
            Station::FoodServer => self.food_servers,
        }
    }
}

/// Events in the movie theater simulation
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Wake the arrival process for the first time
    Start,

    /// Arrival process: the next moviegoer walks in
    Arrival,

    /// First wake-up of a freshly spawned moviegoer
    Arrived,

    /// Moviegoer asks a pool for one unit
    Acquire { customer: AgentId },

    /// Moviegoer hands its unit back to the pool
    Release { customer: AgentId },

    /// Pool grants a unit to a waiting moviegoer
    Granted { station: Station },

    /// Moviegoer's own wake-up once a service is over
    ServiceDone { station: Station },

    /// Moviegoer is seated after `wait` minutes in the theater
    Seated { customer_id: usize, wait: f64 },
}

/// Combined stats enum for all agent types
#[derive(Debug, Clone)]
pub enum Stats {
    Pool(PoolStats),
    Customer(CustomerStats),
    Arrivals(ArrivalStats),
    WaitTimes(WaitTimeLog),
}
