use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

pub const LOG_ENV: &str = "RIFT_FRAMES_LOG";

/// Installs the global subscriber. `RIFT_FRAMES_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let tree = HierarchicalLayer::new(2)
        .with_writer(std::io::stderr)
        .with_targets(true)
        .with_bracketed_fields(true);
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = Registry::default().with(filter).with(tree).try_init();
}
