//! Diagnostic logging setup.
//!
//! Library code logs through `tracing` macros; the binary installs a fmt
//! subscriber on stderr. The filter comes from `DIFFSUB_LOG` (EnvFilter
//! syntax) and defaults to `warn`.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DIFFSUB_LOG";

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
