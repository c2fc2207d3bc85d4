use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::arrivals::ArrivalPolicy;
use crate::samplers::ServiceParams;
use crate::TheaterError;

/// Settings for a staffing search, read from TOML.
///
/// Every key is optional:
///
/// ```toml
/// seed = 42
/// total_employees = 25
/// horizon = 50.0
/// arrival_policy = "per_run"   # or "per_gap"
/// threads = 4
/// report = "best_setup.json"
///
/// [service]
/// ticket_sale_minutes = [1, 3]
/// food_sale_minutes = [1, 5]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub seed: u64,
    pub total_employees: usize,
    /// Minutes of simulated time per staffing configuration
    pub horizon: f64,
    pub arrival_policy: ArrivalPolicy,
    /// Worker threads; rayon's default pool when absent
    pub threads: Option<usize>,
    /// Where to write the JSON report, if anywhere
    pub report: Option<PathBuf>,
    pub service: ServiceParams,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            seed: 42,
            total_employees: 25,
            horizon: 50.0,
            arrival_policy: ArrivalPolicy::PerRun,
            threads: None,
            report: None,
            service: ServiceParams::default(),
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, TheaterError> {
        let config: SearchConfig = toml::from_str(s)?;
        config.service.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TheaterError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
