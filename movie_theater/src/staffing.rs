use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{Station, TheaterError};

/// Number of employees working each station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Staffing {
    pub cashiers: usize,
    pub ushers: usize,
    pub food_servers: usize,
}

impl Staffing {
    pub fn new(cashiers: usize, ushers: usize, food_servers: usize) -> Result<Self, TheaterError> {
        let staffing = Staffing {
            cashiers,
            ushers,
            food_servers,
        };
        staffing.validate()?;
        Ok(staffing)
    }

    /// Check every station has at least one employee
    pub fn validate(&self) -> Result<(), TheaterError> {
        for station in Station::ALL {
            self.nonzero_capacity(station)?;
        }
        Ok(())
    }

    pub fn nonzero_capacity(&self, station: Station) -> Result<NonZeroUsize, TheaterError> {
        NonZeroUsize::new(self.capacity(station)).ok_or(TheaterError::ZeroCapacity { station })
    }

    pub fn capacity(&self, station: Station) -> usize {
        match station {
            Station::Cashier => self.cashiers,
            Station::Usher => self.ushers,
            Station::FoodServer => self.food_servers,
        }
    }

    pub fn headcount(&self) -> usize {
        self.cashiers + self.ushers + self.food_servers
    }

    /// Every staffing with at least one employee per station and fewer than
    /// `total` employees overall.
    ///
    /// Ordered by cashiers, then food servers, then ushers; the search keeps
    /// the first of equally good staffings, so this order breaks ties.
    pub fn within_budget(total: usize) -> Vec<Staffing> {
        let mut triples = Vec::new();
        for cashiers in 1..total.saturating_sub(1) {
            for food_servers in 1..total - cashiers {
                for ushers in 1..total - cashiers - food_servers {
                    triples.push(Staffing {
                        cashiers,
                        ushers,
                        food_servers,
                    });
                }
            }
        }
        triples
    }
}

impl fmt::Display for Staffing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cashiers, {} ushers, {} food servers",
            self.cashiers, self.ushers, self.food_servers
        )
    }
}
