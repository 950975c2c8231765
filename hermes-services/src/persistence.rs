//! Key/value persistence facade
//!
//! A tagged container of the backends available to the runtime: `memory`
//! (always present), `file` (a directory of JSON documents) and `remote`
//! (an externally built client for a key/value server). The facade is a
//! locator only; each backend does its own I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("persistence io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unknown persistence backend: {0}")]
    UnknownBackend(String),

    #[error("persistence backend {0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid remote persistence settings: {0}")]
    InvalidRemoteSettings(String),
}

/// One key/value backend.
///
/// Object-safe raw surface over `serde_json::Value`; typed access goes
/// through [`KeyValueStoreExt`].
pub trait KeyValueStore: Send + Sync {
    fn set_raw(&self, key: &str, value: Value) -> Result<(), PersistenceError>;

    fn get_raw(&self, key: &str) -> Result<Option<Value>, PersistenceError>;
}

/// Typed get/set for any backend
pub trait KeyValueStoreExt: KeyValueStore {
    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        self.set_raw(key, serde_json::to_value(value)?)
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        match self.get_raw(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Process-local backend, always available
#[derive(Default)]
pub struct MemoryService {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryService {
    fn set_raw(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.entries.lock().get(key).cloned())
    }
}

/// Directory-of-JSON-documents backend, one file per key
pub struct JsonFileService {
    directory: PathBuf,
}

impl JsonFileService {
    /// Opens the backend, creating the directory with permissive mode when
    /// it does not exist yet.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let directory = directory.into();
        if !directory.exists() {
            std::fs::create_dir_all(&directory)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&directory, std::fs::Permissions::from_mode(0o777))?;
            }
        }
        Ok(JsonFileService { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileService {
    fn set_raw(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let payload = serde_json::to_vec_pretty(&value)?;
        std::fs::write(self.document_path(key), payload)?;
        Ok(())
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let path = self.document_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let payload = std::fs::read(path)?;
        Ok(Some(serde_json::from_slice(&payload)?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePersistenceConfig {
    pub directory: PathBuf,
}

/// Connection settings for a remote key/value server, validated from
/// environment-style pairs. The client itself is built by an adapter
/// outside this workspace and attached to the facade as a trait object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePersistenceConfig {
    pub host: String,
    pub port: u16,
    pub namespace: Option<String>,
}

impl RemotePersistenceConfig {
    /// Reads `HOST`, `PORT` and optional `NAMESPACE` keys
    pub fn from_env_pairs(pairs: &HashMap<String, String>) -> Result<Self, PersistenceError> {
        let host = pairs
            .get("HOST")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                PersistenceError::InvalidRemoteSettings("HOST is required".to_string())
            })?
            .clone();

        let port = match pairs.get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                PersistenceError::InvalidRemoteSettings(format!("invalid PORT: {raw}"))
            })?,
            None => 6379,
        };

        Ok(RemotePersistenceConfig {
            host,
            port,
            namespace: pairs.get("NAMESPACE").cloned(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub file: Option<FilePersistenceConfig>,
    pub remote: Option<RemotePersistenceConfig>,
}

/// Locator for the configured backends
pub struct PersistenceServiceFacade {
    memory: MemoryService,
    file: Option<JsonFileService>,
    remote: Option<Arc<dyn KeyValueStore>>,
}

impl Default for PersistenceServiceFacade {
    fn default() -> Self {
        PersistenceServiceFacade {
            memory: MemoryService::new(),
            file: None,
            remote: None,
        }
    }
}

impl PersistenceServiceFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a facade from configuration. The remote settings are carried
    /// for the adapter that builds the client; they do not open a
    /// connection here.
    pub fn from_config(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let file = match &config.file {
            Some(conf) => Some(JsonFileService::new(&conf.directory)?),
            None => None,
        };
        Ok(PersistenceServiceFacade {
            memory: MemoryService::new(),
            file,
            remote: None,
        })
    }

    pub fn attach_remote(&mut self, remote: Arc<dyn KeyValueStore>) {
        self.remote = Some(remote);
    }

    pub fn memory(&self) -> &MemoryService {
        &self.memory
    }

    pub fn file(&self) -> Option<&JsonFileService> {
        self.file.as_ref()
    }

    /// Selects a backend by name: `memory`, `file` or `remote`
    pub fn service(&self, name: &str) -> Result<&dyn KeyValueStore, PersistenceError> {
        match name {
            "memory" => Ok(&self.memory),
            "file" => self
                .file
                .as_ref()
                .map(|f| f as &dyn KeyValueStore)
                .ok_or(PersistenceError::NotConfigured("file")),
            "remote" => self
                .remote
                .as_deref()
                .ok_or(PersistenceError::NotConfigured("remote")),
            other => Err(PersistenceError::UnknownBackend(other.to_string())),
        }
    }
}
