/*!
 * Durable key-value slot holding the serialized store.
 *
 * The store blob is kept base64-encoded under a single fixed key. Every write
 * fully overwrites the previous value; the last writer wins.
 */

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::StoreError;

/// Default slot key for the study store
pub const DEFAULT_SLOT_KEY: &str = "studyme_db";

/// Default directory name under the user's data directory
const DEFAULT_SLOT_DIRNAME: &str = "studyme";

/// Text-valued durable storage addressed by key
pub trait DurableSlot: Send + Sync {
    /// Read the value stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Encode a store blob for the slot
pub fn encode_blob(blob: &[u8]) -> String {
    STANDARD.encode(blob)
}

/// Decode a slot value back into a store blob
pub fn decode_blob(key: &str, value: &str) -> Result<Vec<u8>, StoreError> {
    STANDARD
        .decode(value.trim())
        .map_err(|source| StoreError::SlotEncoding {
            key: key.to_string(),
            source,
        })
}

/// Slot backed by one file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Create a slot rooted at `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the default slot directory
    pub fn default_dir() -> anyhow::Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_SLOT_DIRNAME))
    }

    /// Directory holding the slot files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl DurableSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path)?;
        debug!("Read slot '{}' ({} chars)", key, value.len());
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        // Write beside the target and rename so a crash never leaves half a value
        let path = self.path_for(key);
        let staging = self.dir.join(format!(".{}.tmp", key));
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;

        debug!("Wrote slot '{}' ({} chars)", key, value.len());
        Ok(())
    }
}

/// Slot kept in process memory
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    /// Create an empty memory slot
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|e| StoreError::SlotIo(std::io::Error::other(e.to_string())))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StoreError::SlotIo(std::io::Error::other(e.to_string())))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
