use std::fmt;

use super::tab::{TabId, WindowId};

// === ProviderError ===

/// Errors reported by a tab/window provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No tab with the given ID exists (it may have been closed concurrently).
    TabNotFound(TabId),
    /// No window with the given ID exists.
    WindowNotFound(WindowId),
    /// The provider refused the operation, e.g. a blocked URL.
    Rejected(String),
    /// The provider could not be reached at all.
    Unavailable(String),
}

impl ProviderError {
    /// True when the target of a removal no longer exists.
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            ProviderError::TabNotFound(_) | ProviderError::WindowNotFound(_)
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            ProviderError::WindowNotFound(id) => write!(f, "Window not found: {}", id),
            ProviderError::Rejected(msg) => write!(f, "Provider rejected operation: {}", msg),
            ProviderError::Unavailable(msg) => write!(f, "Provider unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

// === StoreError ===

/// Errors reported by the persistence store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backing storage could not be read or written.
    Unavailable(String),
    /// A stored value could not be encoded or decoded.
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Store serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

// === SessionError ===

/// Errors related to session capture, restore and archive management.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The referenced session, favorite or last session does not exist.
    NotFound(String),
    /// An import payload is not a sequence of session records.
    InvalidFormat(String),
    /// The provider failed while reading the state a whole operation depends on.
    ProviderOperationFailed(String),
    /// The archive could not be read or written.
    StoreUnavailable(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound(what) => write!(f, "Session not found: {}", what),
            SessionError::InvalidFormat(msg) => write!(f, "Invalid session format: {}", msg),
            SessionError::ProviderOperationFailed(msg) => {
                write!(f, "Session provider operation failed: {}", msg)
            }
            SessionError::StoreUnavailable(msg) => {
                write!(f, "Session store unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::StoreUnavailable(e.to_string())
    }
}

impl From<ProviderError> for SessionError {
    fn from(e: ProviderError) -> Self {
        SessionError::ProviderOperationFailed(e.to_string())
    }
}

impl From<SettingsError> for SessionError {
    fn from(e: SettingsError) -> Self {
        SessionError::StoreUnavailable(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The settings record could not be read or written.
    StoreUnavailable(String),
    /// The patch names an option that does not exist.
    InvalidKey(String),
    /// The patch carries a value of the wrong shape for its option.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::StoreUnavailable(msg) => {
                write!(f, "Settings store unavailable: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<StoreError> for SettingsError {
    fn from(e: StoreError) -> Self {
        SettingsError::StoreUnavailable(e.to_string())
    }
}

// === TabActionError ===

/// Errors from the tab cleanup operations: duplicates, focus mode and the
/// inactivity sweep.
///
/// Individual rejected removals never surface here; they are counted in the
/// operation's report.
#[derive(Debug, Clone, PartialEq)]
pub enum TabActionError {
    /// The live tab state could not be read.
    ProviderOperationFailed(String),
    /// The settings record could not be read.
    StoreUnavailable(String),
}

impl fmt::Display for TabActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabActionError::ProviderOperationFailed(msg) => {
                write!(f, "Tab provider operation failed: {}", msg)
            }
            TabActionError::StoreUnavailable(msg) => {
                write!(f, "Settings store unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for TabActionError {}

impl From<ProviderError> for TabActionError {
    fn from(e: ProviderError) -> Self {
        TabActionError::ProviderOperationFailed(e.to_string())
    }
}

impl From<SettingsError> for TabActionError {
    fn from(e: SettingsError) -> Self {
        TabActionError::StoreUnavailable(e.to_string())
    }
}

// === ConfigError ===

/// Errors loading the engine configuration file.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Io(String),
    /// The file is not a valid configuration.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
