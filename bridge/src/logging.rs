use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber on stderr (stdout carries VM lines in the host tools).
/// Later calls are no-ops, since both `JNI_OnLoad` and the binaries call this.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
