//! Movie theater staffing search
//!
//! Usage: `movie_theater [config.toml]`

use std::env;
use std::process;

use movie_theater::logging::init_logging;
use movie_theater::search::{ConfigResult, search, split_minutes};
use movie_theater::{SearchConfig, TheaterError};

fn main() {
    init_logging("info");

    if let Err(e) = run() {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), TheaterError> {
    let config = match env::args().nth(1) {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };

    println!("=== Movie Theater Staffing ===\n");
    println!("Configuration:");
    println!("  Employees: at most {}", config.total_employees);
    println!("  Minutes simulated: {}", config.horizon);
    println!("  Seed: {}", config.seed);
    println!("  Arrival interval: {:?}\n", config.arrival_policy);

    let outcome = search(&config)?;

    println!(
        "Simulated {} configurations ({} failed)\n",
        outcome.results.len() + outcome.failed.len(),
        outcome.failed.len()
    );

    match &outcome.best {
        Some(best @ ConfigResult {
            mean_wait: Some(mean),
            ..
        }) => {
            let (minutes, seconds) = split_minutes(*mean);
            println!(
                "The best average wait time is {minutes} minutes and {seconds} seconds, \
                 with {} seated moviegoers,",
                best.seated
            );
            println!("using {}.", best.staffing);
        }
        _ => println!("Nobody was seated within {} minutes.", config.horizon),
    }

    if let Some(path) = &config.report {
        outcome.write_json(path)?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}
