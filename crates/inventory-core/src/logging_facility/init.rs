//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Default filter directive when `RUST_LOG` is not set
const DEFAULT_DEBUG_DIRECTIVE: &str =
    "inventory_core=debug,inventory_store=debug,inventory_engine=debug,inventory=debug";
const DEFAULT_INFO_DIRECTIVE: &str =
    "inventory_core=info,inventory_store=info,inventory_engine=info,inventory=info";
const DEFAULT_WARN_DIRECTIVE: &str = "warn";

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Human-readable output, warnings and errors only
    Console,
    /// Test capture mode for deterministic testing
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// This function should be called once at application startup.
/// It sets up the tracing subscriber based on the selected profile.
///
/// # Profiles
///
/// - **Development**: Human-readable logs with debug level
/// - **Production**: JSON structured logs with info level
/// - **Console**: Human-readable logs with warn level, for interactive use
/// - **Test**: No output; use `init_test_capture()` to assert on events
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DEBUG_DIRECTIVE)),
                )
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_INFO_DIRECTIVE)),
                )
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Console => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_WARN_DIRECTIVE)),
                )
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Test => {
            // Test capture is initialized separately via init_test_capture()
            tracing_subscriber::registry().init();
        }
    });
}
