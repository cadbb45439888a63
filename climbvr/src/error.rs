use std::fmt;
use std::io;
use std::path::PathBuf;

/// Construction-time failures. The per-tick path never fails; a missed
/// query or lost tracking is an ordinary outcome.
#[derive(Debug)]
pub enum LocomotionError {
    /// A configuration value outside its usable range
    InvalidConfig { field: &'static str, reason: String },

    /// Reading a configuration file failed
    ConfigIo { path: PathBuf, source: io::Error },

    /// A configuration document could not be decoded
    ConfigParse { source: serde_json::Error },
}

impl LocomotionError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LocomotionError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LocomotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocomotionError::InvalidConfig { field, reason } => {
                write!(f, "Invalid locomotion config '{}': {}", field, reason)
            }
            LocomotionError::ConfigIo { path, source } => {
                write!(f, "Failed to read config '{}': {}", path.display(), source)
            }
            LocomotionError::ConfigParse { source } => {
                write!(f, "Failed to parse locomotion config: {}", source)
            }
        }
    }
}

impl std::error::Error for LocomotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocomotionError::InvalidConfig { .. } => None,
            LocomotionError::ConfigIo { source, .. } => Some(source),
            LocomotionError::ConfigParse { source } => Some(source),
        }
    }
}

impl From<serde_json::Error> for LocomotionError {
    fn from(source: serde_json::Error) -> Self {
        LocomotionError::ConfigParse { source }
    }
}

pub type Result<T> = std::result::Result<T, LocomotionError>;
