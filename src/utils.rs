/// Installs the default `tracing` subscriber, filtered through `RUST_LOG`.
/// Safe to call repeatedly, only the first subscriber wins.
#[cfg(feature = "logging")]
pub(crate) fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init();
}
