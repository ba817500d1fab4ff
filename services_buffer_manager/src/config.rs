//! Buffer manager settings and their persistence
//!
//! Settings are stored as versioned JSON. Loading is safe against corruption:
//! a file that fails to parse or carries an unknown version falls back to the
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use buffer_core::DEFAULT_RECENT_CAPACITY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the pool capacity
pub const BUFFER_MAX: usize = 100;

/// Default pool capacity
pub const DEFAULT_BUFFERS: usize = 10;

/// Recent-files list, inside the state directory
pub const RECENT_FILE_NAME: &str = ".bufferd.recent";

/// Default session, inside the state directory
pub const SESSION_FILE_NAME: &str = ".bufferd.session";

/// Environment variable naming the state directory
pub const HOME_ENV: &str = "BUFFERD_HOME";

/// Buffer manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    /// Requested pool capacity; see [`BufferSettings::capacity`]
    pub buffers: usize,
    /// Quick-switch and close follow the MRU order
    pub zorder_switching: bool,
    /// Load the recent list at startup, write it at quit
    pub save_recent: bool,
    /// Restore the default session at startup, write it at quit
    pub save_session: bool,
    /// Closing the last buffer asks the host to quit
    pub quit_on_close_last: bool,
    /// Reload files changed on disk when the editor regains focus
    pub load_on_activate: bool,
    /// Save the current titled buffer when the editor loses focus
    pub save_on_deactivate: bool,
    /// Ask before saving a dirty buffer that is being closed
    pub are_you_sure: bool,
    /// Open files read-only
    pub read_only: bool,
    pub recent_capacity: usize,
    /// Where the recent list and default session live
    pub state_dir: Option<PathBuf>,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            buffers: DEFAULT_BUFFERS,
            zorder_switching: false,
            save_recent: false,
            save_session: false,
            quit_on_close_last: false,
            load_on_activate: false,
            save_on_deactivate: false,
            are_you_sure: true,
            read_only: false,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            state_dir: None,
        }
    }
}

impl BufferSettings {
    /// Pool capacity, clamped to `1..=BUFFER_MAX`
    pub fn capacity(&self) -> usize {
        self.buffers.clamp(1, BUFFER_MAX)
    }

    /// Resolved state directory
    ///
    /// Falls back to `$BUFFERD_HOME`, then `$HOME`, then the working
    /// directory.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        std::env::var_os(HOME_ENV)
            .or_else(|| std::env::var_os("HOME"))
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn recent_path(&self) -> PathBuf {
        self.state_dir().join(RECENT_FILE_NAME)
    }

    pub fn default_session_path(&self) -> PathBuf {
        self.state_dir().join(SESSION_FILE_NAME)
    }
}

/// Serializable container for settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsData {
    /// Version of the settings format (for future migrations)
    pub version: u32,
    pub settings: BufferSettings,
}

impl SettingsData {
    /// Current version of the settings format
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(settings: BufferSettings) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            settings,
        }
    }
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur during persistence operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Failed to serialize settings: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize settings: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported settings version: {0}")]
    UnsupportedVersion(u32),

    #[error("Settings file error: {0}")]
    Io(String),
}

/// Serializes settings to JSON bytes
pub fn serialize_settings(settings: &BufferSettings) -> PersistenceResult<Vec<u8>> {
    serde_json::to_vec_pretty(&SettingsData::new(settings.clone()))
        .map_err(|e| PersistenceError::SerializationFailed(e.to_string()))
}

/// Deserializes settings from JSON bytes
pub fn deserialize_settings(bytes: &[u8]) -> PersistenceResult<BufferSettings> {
    let data: SettingsData = serde_json::from_slice(bytes)
        .map_err(|e| PersistenceError::DeserializationFailed(e.to_string()))?;

    if data.version != SettingsData::CURRENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(data.version));
    }

    Ok(data.settings)
}

/// Attempts to load settings from bytes, falling back to defaults on error
pub fn load_settings_safe(bytes: &[u8]) -> BufferSettings {
    deserialize_settings(bytes).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable settings");
        BufferSettings::default()
    })
}

/// Reads a settings file
pub fn load_settings_file(path: &Path) -> PersistenceResult<BufferSettings> {
    let bytes = fs::read(path).map_err(|e| PersistenceError::Io(e.to_string()))?;
    deserialize_settings(&bytes)
}

/// Writes a settings file
pub fn save_settings_file(path: &Path, settings: &BufferSettings) -> PersistenceResult<()> {
    let bytes = serialize_settings(settings)?;
    fs::write(path, bytes).map_err(|e| PersistenceError::Io(e.to_string()))
}
