use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Log to stderr so previews on stdout stay readable. `RUST_LOG` overrides
/// the default level.
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(
        "energy_balance_report=info"
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
