pub use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
};

/// Installs the global subscriber, filtering on `RUST_LOG` (default `info`).
pub fn init() {
    init_with_default("info");
}

/// Same as [`init`] with a caller-chosen fallback directive. A second call
/// is a no-op.
pub fn init_with_default(default_directive: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let span_events = if wants_span_timing(&env_filter) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn wants_span_timing(filter: &EnvFilter) -> bool {
    let directives = filter.to_string();
    directives.contains("debug")
        || directives.contains("trace")
        || std::env::var("RUST_LOG").unwrap_or_default().contains("debug")
}
