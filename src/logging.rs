use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system.
///
/// Console output goes to stderr so the record protocol on stdout stays
/// clean. When `AMP_LOG_DIR` is set, a JSON file layer with daily rotation
/// is added under that directory.
pub fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive("amp_source=info".parse().unwrap());
    let console_layer = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(console_layer);

    if let Ok(dir) = std::env::var("AMP_LOG_DIR") {
        let _ = fs::create_dir_all(&dir);
        let file_appender = tracing_appender::rolling::daily(&dir, "amp_source.log");
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(fmt::layer().json().with_writer(non_blocking_writer))
            .init();
        // The guard must outlive the process so logs are flushed on exit.
        std::mem::forget(guard);
    } else {
        registry.init();
    }
}
