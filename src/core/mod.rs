pub mod config;
pub mod errors;
pub mod geometry;
pub mod model;

pub use config::AlignConfig;
pub use errors::{ConfigError, SkipReason};
pub use geometry::{BBox, Region};
pub use model::{BlockLabel, OcrBlock, Orientation, PageId, Side};

pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
