use std::fmt;

/// Lifecycle shared by every part a machine is assembled from.
///
/// Parts are created by the registry, configured through their own typed
/// setters, then `finish`ed once before use. Dropping a part frees it.
pub trait Component {
    /// Registry name of this part (e.g. `"HD6309"`, `"SAM"`).
    fn name(&self) -> &'static str;

    /// Validate configuration and complete construction.
    fn finish(&mut self) -> Result<(), PartError> {
        Ok(())
    }

    /// Return to power-on state. Scheduled events owned by the part are
    /// re-queued by the owning machine.
    fn reset(&mut self);
}

/// Errors raised while assembling parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartError {
    /// No part or machine registered under this name.
    UnknownPart(String),
    /// A part rejected its configuration in `finish`.
    InvalidConfig { part: &'static str, reason: String },
}

impl fmt::Display for PartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPart(name) => write!(f, "unknown part '{name}'"),
            Self::InvalidConfig { part, reason } => {
                write!(f, "invalid configuration for {part}: {reason}")
            }
        }
    }
}

impl std::error::Error for PartError {}
