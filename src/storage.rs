use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

pub const CONTENT_KEY: &str = "typewriter-content";
pub const ONBOARDING_KEY: &str = "typewriter-onboarding-seen";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Persistence { store }
    }

    pub fn load_content(&self) -> Option<String> {
        match self.store.get(CONTENT_KEY) {
            Ok(content) => content.filter(|c| !c.is_empty()),
            Err(err) => {
                warn!(target: "typewriter.storage", %err, "load_content_failed");
                None
            }
        }
    }

    /// Stores the page. An empty page is not written.
    pub fn save_content(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        if let Err(err) = self.store.set(CONTENT_KEY, content) {
            warn!(target: "typewriter.storage", %err, "save_content_failed");
        }
    }

    pub fn clear_content(&mut self) {
        if let Err(err) = self.store.remove(CONTENT_KEY) {
            warn!(target: "typewriter.storage", %err, "clear_content_failed");
        }
    }

    pub fn onboarding_seen(&self) -> bool {
        match self.store.get(ONBOARDING_KEY) {
            Ok(flag) => flag.is_some(),
            Err(err) => {
                warn!(target: "typewriter.storage", %err, "load_onboarding_flag_failed");
                false
            }
        }
    }

    pub fn mark_onboarding_seen(&mut self) {
        debug!(target: "typewriter.storage", "onboarding_seen");
        if let Err(err) = self.store.set(ONBOARDING_KEY, "true") {
            warn!(target: "typewriter.storage", %err, "save_onboarding_flag_failed");
        }
    }
}
