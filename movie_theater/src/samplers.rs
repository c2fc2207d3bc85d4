//! Service-time and arrival-interval distributions, in minutes

use rand::Rng;
use rand::distr::Uniform;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::{Station, TheaterError};

/// Distribution parameters for every stochastic duration in the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceParams {
    /// Inclusive range of whole minutes to sell a ticket
    pub ticket_sale_minutes: (u32, u32),
    pub ticket_check_mean: f64,
    pub ticket_check_std_dev: f64,
    /// Inclusive range of whole minutes to sell food
    pub food_sale_minutes: (u32, u32),
    pub arrival_interval_mean: f64,
    pub arrival_interval_std_dev: f64,
}

impl Default for ServiceParams {
    fn default() -> Self {
        ServiceParams {
            ticket_sale_minutes: (1, 3),
            ticket_check_mean: 3.0 / 60.0,
            ticket_check_std_dev: 1.0 / 60.0,
            food_sale_minutes: (1, 5),
            arrival_interval_mean: 12.0 / 60.0,
            arrival_interval_std_dev: 5.0 / 60.0,
        }
    }
}

impl ServiceParams {
    pub fn service_times(&self) -> Result<ServiceTimes, TheaterError> {
        Ok(ServiceTimes {
            ticket_sale: whole_minutes("ticket sale", self.ticket_sale_minutes)?,
            ticket_check: PositiveNormal::new(
                "ticket check",
                self.ticket_check_mean,
                self.ticket_check_std_dev,
            )?,
            food_sale: whole_minutes("food sale", self.food_sale_minutes)?,
        })
    }

    pub fn arrival_interval(&self) -> Result<PositiveNormal, TheaterError> {
        PositiveNormal::new(
            "arrival interval",
            self.arrival_interval_mean,
            self.arrival_interval_std_dev,
        )
    }

    /// Build every distribution once to surface bad parameters early
    pub fn validate(&self) -> Result<(), TheaterError> {
        self.service_times()?;
        self.arrival_interval()?;
        Ok(())
    }
}

fn whole_minutes(name: &'static str, (low, high): (u32, u32)) -> Result<Uniform<u32>, TheaterError> {
    if low == 0 {
        return Err(TheaterError::InvalidDistribution {
            name,
            reason: "a service takes at least one minute".to_string(),
        });
    }
    Uniform::new_inclusive(low, high).map_err(|e| TheaterError::InvalidDistribution {
        name,
        reason: format!("range {low}..={high}: {e}"),
    })
}

/// Normal distribution conditioned on a strictly positive result.
///
/// Draws are rejected and repeated until one is above zero, which keeps the
/// shape of the upper part of the distribution instead of piling clamped
/// values up at zero. The mean must be positive, so at least half of all
/// draws are accepted; there is no cap on the number of attempts.
#[derive(Debug, Clone, Copy)]
pub struct PositiveNormal {
    normal: Normal<f64>,
}

impl PositiveNormal {
    pub fn new(name: &'static str, mean: f64, std_dev: f64) -> Result<Self, TheaterError> {
        if !(mean.is_finite() && mean > 0.0) {
            return Err(TheaterError::InvalidDistribution {
                name,
                reason: format!("mean must be positive and finite, got {mean}"),
            });
        }
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(TheaterError::InvalidDistribution {
                name,
                reason: format!("std dev must be non-negative and finite, got {std_dev}"),
            });
        }
        let normal = Normal::new(mean, std_dev).map_err(|e| TheaterError::InvalidDistribution {
            name,
            reason: format!("std dev {std_dev}: {e}"),
        })?;
        Ok(PositiveNormal { normal })
    }

    pub fn mean(&self) -> f64 {
        self.normal.mean()
    }

    pub fn std_dev(&self) -> f64 {
        self.normal.std_dev()
    }
}

impl Distribution<f64> for PositiveNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let x = self.normal.sample(rng);
            if x > 0.0 {
                return x;
            }
        }
    }
}

/// The three service-time samplers, one per station
#[derive(Debug, Clone)]
pub struct ServiceTimes {
    ticket_sale: Uniform<u32>,
    ticket_check: PositiveNormal,
    food_sale: Uniform<u32>,
}

impl ServiceTimes {
    pub fn sample<R: Rng + ?Sized>(&self, station: Station, rng: &mut R) -> f64 {
        match station {
            Station::Cashier => self.ticket_sale.sample(rng) as f64,
            Station::Usher => self.ticket_check.sample(rng),
            Station::FoodServer => self.food_sale.sample(rng) as f64,
        }
    }
}
