//! Concrete save backends
//!
//! Native builds write a JSON file (tmp then rename); the web build keeps the
//! same JSON under a LocalStorage key.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{SaveData, SaveStore};

/// JSON save file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SaveStore for JsonFileStore {
    fn load(&self) -> anyhow::Result<Option<SaveData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("reading save file {}", self.path.display()))?;
        let data = SaveData::from_json(&json)
            .with_context(|| format!("parsing save file {}", self.path.display()))?;
        Ok(Some(data))
    }

    fn save(&mut self, data: &SaveData) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).with_context(|| format!("creating save directory {}", dir.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(data).context("encoding save data")?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing save file {}", self.path.display()))?;
        log::debug!("Saved game data to {}", self.path.display());
        Ok(())
    }
}

/// Save data in the browser's LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    /// LocalStorage key
    pub const DEFAULT_KEY: &'static str = "asteroidBlasterData";

    pub fn new() -> Self {
        Self::with_key(Self::DEFAULT_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> anyhow::Result<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .context("LocalStorage unavailable")
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn load(&self) -> anyhow::Result<Option<SaveData>> {
        let storage = Self::storage()?;
        let json = storage
            .get_item(&self.key)
            .map_err(|e| anyhow::anyhow!("reading {}: {e:?}", self.key))?;
        match json {
            Some(json) => Ok(Some(SaveData::from_json(&json).context("parsing stored save data")?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, data: &SaveData) -> anyhow::Result<()> {
        let storage = Self::storage()?;
        let json = data.to_json().context("encoding save data")?;
        storage
            .set_item(&self.key, &json)
            .map_err(|e| anyhow::anyhow!("writing {}: {e:?}", self.key))?;
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("asteroid-blaster-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_is_none() {
        let store = JsonFileStore::new(temp_path("missing.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("round.json");
        let mut store = JsonFileStore::new(&path);
        let mut data = SaveData::default();
        data.high_score = 4200;
        data.modifiers.slow_mode = true;
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));
        assert!(!store.tmp_path().exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_errors_with_path() {
        let path = temp_path("corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{\"highScore\": ").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("corrupt.json"));
        let _ = fs::remove_file(&path);
    }
}
