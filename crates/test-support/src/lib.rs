//! Test-only helpers shared across `dagrunner`'s integration and property
//! tests: scheduler/task builders and a callback recorder for asserting on
//! event order without each test hand-rolling `Arc<Mutex<Vec<_>>>` bookkeeping.

pub mod builders;
pub mod recorder;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Uses `with_test_writer()`, so logs are only shown for failing tests
/// (unless run with `-- --nocapture`). Enable levels with e.g.
/// `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}
