//! Logging setup for test harnesses.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install a global `fmt` subscriber writing through the test harness.
///
/// Returns `false` if a global subscriber was already installed, which makes
/// repeated calls from several tests harmless.
pub fn init_test_logging(level: Level) -> bool {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
