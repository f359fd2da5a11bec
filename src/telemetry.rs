use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// JSON (bunyan) subscriber writing to stdout. `RUST_LOG` overrides
/// `env_filter` when set.
pub fn get_subscriber(name: String, env_filter: String) -> impl Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, std::io::stdout);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Installs `subscriber` globally and routes `log` records into it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), String> {
    LogTracer::init().map_err(|err| format!("Failed to set logger: {}", err))?;
    set_global_default(subscriber).map_err(|err| format!("Failed to set subscriber: {}", err))
}
