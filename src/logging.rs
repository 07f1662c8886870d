//=========================================================================
// Logging
//=========================================================================
//
// Centralized logger initialization over the `log` facade.
//
// Filter precedence: explicit argument, then RUST_LOG, then info level.
// Idempotent; later calls are ignored.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::Once;

//=== External Crates =====================================================

use log::LevelFilter;

//=========================================================================

static INIT: Once = Once::new();

/// Initializes the global logger once. Intended usage is early in `main`.
///
/// `filter` follows the `env_logger` filter syntax, e.g. `"info"` or
/// `"spheres_shell=debug,winit=warn"`.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(env) = std::env::var("RUST_LOG") {
            builder.parse_filters(&env);
        } else {
            builder.filter_level(LevelFilter::Info);
        }

        builder.init();
        log::debug!("Logging initialized");
    });
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_ignored() {
        init_logging(Some("warn"));
        init_logging(Some("debug"));
        init_logging(None);
    }
}
