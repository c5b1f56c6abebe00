//! Subscriber setup for the `trace` feature. Without it no subscriber is
//! installed and the library's events go nowhere.

#[cfg(feature = "trace")]
use std::path::Path;
#[cfg(feature = "trace")]
use std::sync::Once;

#[cfg(feature = "trace")]
use tracing_appender::non_blocking::WorkerGuard;
#[cfg(feature = "trace")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "trace")]
static INIT: Once = Once::new();

/// Human-readable events on stderr, or JSON lines in `<log_dir>/kolink-trace.jsonl`.
///
/// Keep the returned guard alive until exit so buffered file output is flushed.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kolink_core=info"))
    };

    let mut guard = None;
    INIT.call_once(|| match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, "kolink-trace.jsonl");
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(worker_guard);

            tracing_subscriber::fmt()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
                .with_env_filter(filter())
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_env_filter(filter())
                .init();
        }
    });
    guard
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: Option<&std::path::Path>) -> Option<()> {
    None
}
