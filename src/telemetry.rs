use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(verbose: bool) {
    let default = if verbose {
        "info,cam_scan_rs=debug,tower_http=debug"
    } else {
        "warn,cam_scan_rs=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
