/*!
 * Error types for the Pulsar client
 */

use pulsar_core_dispatch::RegistryError;
use pulsar_core_people::StoreError;
use pulsar_proto::StatusCode;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PulsarError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum PulsarError {
    /// Configuration file could not be read, parsed or written
    Config(String),

    /// Configuration file given explicitly does not exist
    ConfigNotFound(PathBuf),

    /// I/O error
    Io(io::Error),

    /// Command table could not be built
    Registry(RegistryError),

    /// People store could not be loaded
    Store(StoreError),

    /// Invalid command line input
    Usage(String),
}

impl PulsarError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PulsarError::Usage(_) => EXIT_FAILED,
            _ => EXIT_FATAL,
        }
    }
}

/// Exit code for the status of a completed exchange
pub fn exit_code_for(status: StatusCode) -> i32 {
    if status.is_ok() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILED
    }
}

impl fmt::Display for PulsarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulsarError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PulsarError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            PulsarError::Io(err) => write!(f, "I/O error: {}", err),
            PulsarError::Registry(err) => write!(f, "Command registry error: {}", err),
            PulsarError::Store(err) => write!(f, "Store error: {}", err),
            PulsarError::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PulsarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PulsarError::Io(err) => Some(err),
            PulsarError::Registry(err) => Some(err),
            PulsarError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PulsarError {
    fn from(err: io::Error) -> Self {
        PulsarError::Io(err)
    }
}

impl From<RegistryError> for PulsarError {
    fn from(err: RegistryError) -> Self {
        PulsarError::Registry(err)
    }
}

impl From<StoreError> for PulsarError {
    fn from(err: StoreError) -> Self {
        PulsarError::Store(err)
    }
}

impl From<toml::de::Error> for PulsarError {
    fn from(err: toml::de::Error) -> Self {
        PulsarError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for PulsarError {
    fn from(err: toml::ser::Error) -> Self {
        PulsarError::Config(format!("TOML write error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PulsarError::Config("bad".into()).exit_code(), EXIT_FATAL);
        assert_eq!(
            PulsarError::ConfigNotFound(PathBuf::from("missing.toml")).exit_code(),
            EXIT_FATAL
        );
        assert_eq!(PulsarError::Usage("no command".into()).exit_code(), EXIT_FAILED);
    }

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(exit_code_for(StatusCode::Ok), EXIT_SUCCESS);
        for status in StatusCode::ALL.iter().filter(|s| !s.is_ok()) {
            assert_eq!(exit_code_for(*status), EXIT_FAILED);
        }
    }

    #[test]
    fn test_display_and_source() {
        use std::error::Error;

        let err = PulsarError::from(io::Error::new(io::ErrorKind::Other, "disk gone"));
        assert_eq!(err.to_string(), "I/O error: disk gone");
        assert!(err.source().is_some());

        let err = PulsarError::ConfigNotFound(PathBuf::from("/etc/pulsar.toml"));
        assert!(err.to_string().contains("/etc/pulsar.toml"));
        assert!(err.source().is_none());
    }
}
