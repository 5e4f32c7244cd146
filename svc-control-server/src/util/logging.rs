use std::sync::Once;

use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::{EnvFilter, prelude::*};

static INIT: Once = Once::new();

/// Installs the global subscriber. `level` is an `EnvFilter` directive such as
/// `info` or `svc_control=debug,sqlx=warn`; an invalid directive falls back to
/// `info`. Later calls are no-ops.
pub fn init_tracing(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().with_target(true))
            .init();
    });
}
