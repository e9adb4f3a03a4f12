use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directives` is used, with
/// `verbose` lowering this crate to debug.
pub fn init(default_directives: &str, verbose: bool) {
    let directives = if verbose {
        format!("{},video_qa=debug", default_directives)
    } else {
        default_directives.to_string()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
