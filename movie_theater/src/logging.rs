//! Terminal logging for the staffing search
//!
//! `RUST_LOG` takes precedence over the level passed in, e.g.
//!
//! ```bash
//! RUST_LOG=movie_theater=debug,des=info movie_theater theater.toml
//! RUST_LOG=des=trace movie_theater     # every delivered event
//! ```

use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber logging at `level` ("error" to "trace").
///
/// Does nothing if a subscriber is already installed, so tests and
/// embedding programs can call it freely.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("movie_theater={level},des={level}")));

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        debug!(level, "logging initialized");
    }
}
