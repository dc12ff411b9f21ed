use thiserror::Error;

use crate::descriptor::PluginId;

/// Errors that can occur during plugin registration.
///
/// Registration errors indicate a packaging defect, not a runtime
/// condition: the host is expected to treat them as fatal at startup.
/// Metadata validation misses and capability mismatches are not errors —
/// the pipeline absorbs them as "capability does not apply".
#[derive(Debug, Error)]
pub enum PluginError {
    /// Another plugin already registered under this identifier.
    #[error("Duplicate plugin identifier: {0}")]
    DuplicateIdentifier(PluginId),
    /// The identifier is empty or contains invalid characters.
    #[error("Invalid plugin identifier: {0}")]
    InvalidIdentifier(String),
}

/// A specialized Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
