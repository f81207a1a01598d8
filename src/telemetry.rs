use std::time::Instant;

use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over `level`.
/// Later calls are ignored.
pub fn init_tracing(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok();
}

/// Runs `f` and logs how long it took.
pub fn timeit<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let t0 = Instant::now();
    let out = f();
    info!(stage = label, elapsed = ?t0.elapsed(), "done");
    out
}
