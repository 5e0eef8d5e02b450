use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Install the global fmt subscriber for CLI commands.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Operator
/// progress lines are plain `info!` events, so the default keeps them visible
/// while silencing connection-pool chatter from the HTTP stack.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_filter},hyper=warn,reqwest=warn")));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
