/*!
 * Pulsar - command dispatch over UDP
 *
 * Client-side library for the `pulsar` CLI and shared ambient pieces
 * for the Star:
 * - TOML configuration with CLI overrides
 * - Structured logging (compact stderr or JSON file)
 * - Exit-code mapping for result statuses
 * - Result rendering (stdout for success, stderr for failures)
 * - Command sessions, remote or offline
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod session;

// Re-export commonly used types
pub use config::{LogLevel, PulsarConfig};
pub use error::{exit_code_for, PulsarError, Result};
pub use output::{render, Channel};
pub use session::{build_registry, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
