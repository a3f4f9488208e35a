mod backend;
mod file;
mod memory;

pub use backend::ClientStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{default_state_dir, AetherConfig};
use crate::error::{AetherError, Result};

/// Key holding the signed-in [`User`](crate::model::User). Absent means logged out.
pub const USER_KEY: &str = "user";
/// Key holding the active [`SessionSummary`](crate::model::SessionSummary).
pub const CURRENT_SESSION_KEY: &str = "currentSession";

/// Enum wrapper for storage backends. Dispatches to the concrete implementation.
/// Clones are handles to the same underlying state.
#[derive(Debug, Clone)]
pub enum Storage {
    File(FileStorage),
    Memory(MemoryStorage),
}

impl ClientStorage for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Storage::File(s) => s.get(key),
            Storage::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Storage::File(s) => s.set(key, value),
            Storage::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self {
            Storage::File(s) => s.remove(key),
            Storage::Memory(s) => s.remove(key),
        }
    }
}

impl Storage {
    pub fn in_memory() -> Self {
        Storage::Memory(MemoryStorage::new())
    }

    /// Human-readable location for status output.
    pub fn describe(&self) -> String {
        match self {
            Storage::File(s) => s.dir().display().to_string(),
            Storage::Memory(_) => "memory".to_string(),
        }
    }

    /// Read and parse a JSON value.
    ///
    /// A value that fails to parse is reported as an error; callers that treat
    /// corrupt state as absent (identity hydration) decide that themselves.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }

    /// Write `Some` through, delete on `None`.
    pub fn put_json<T: Serialize>(&self, key: &str, value: Option<&T>) -> Result<()> {
        match value {
            Some(v) => self.set_json(key, v),
            None => self.remove(key),
        }
    }
}

/// Create the storage backend selected by the configuration.
pub fn create_storage(config: &AetherConfig) -> Result<Storage> {
    match config.storage.backend.as_str() {
        "file" => {
            let dir = match &config.storage.path {
                Some(p) => std::path::PathBuf::from(p),
                None => default_state_dir()?,
            };
            Ok(Storage::File(FileStorage::new(dir)))
        }
        "memory" => Ok(Storage::in_memory()),
        other => Err(AetherError::Config(format!(
            "unknown storage backend: {other}"
        ))),
    }
}
