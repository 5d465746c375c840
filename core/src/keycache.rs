//! The one persisted secret: the summarizer API key, kept in a small JSON
//! file under the state directory.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_KEY_NAME: &str = "openai_api_key";
const CACHE_FILE: &str = "keys.json";

#[derive(Debug, Clone)]
pub struct KeyCache {
    path: PathBuf,
}

impl KeyCache {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(CACHE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = std::fs::read(&self.path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Config(format!("unreadable key cache {}: {}", self.path.display(), e))
        })
    }

    /// Writes an owner-only sibling file, then renames it over the cache.
    fn store(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let written = opts.open(&tmp).and_then(|mut f| {
            f.write_all(&body)?;
            f.sync_all()
        });
        if let Err(e) = written.and_then(|_| std::fs::rename(&tmp, &self.path)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn get(&self) -> CoreResult<Option<String>> {
        Ok(self
            .load()?
            .remove(API_KEY_NAME)
            .filter(|k| !k.trim().is_empty()))
    }

    pub fn set(&self, key: &str) -> CoreResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::Validation("API key must not be empty".to_string()));
        }
        let mut entries = self.load()?;
        entries.insert(API_KEY_NAME.to_string(), key.to_string());
        self.store(&entries)?;
        debug!(path = %self.path.display(), "api key cached");
        Ok(())
    }

    /// Returns whether a key was present.
    pub fn clear(&self) -> CoreResult<bool> {
        let mut entries = self.load()?;
        let had = entries.remove(API_KEY_NAME).is_some();
        if had {
            self.store(&entries)?;
        }
        Ok(had)
    }

    /// The cached key with all but the last four characters hidden.
    pub fn show_masked(&self) -> CoreResult<Option<String>> {
        Ok(self.get()?.map(|k| mask(&k)))
    }
}

pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let keep = if chars.len() > 8 { 4 } else { 0 };
    let hidden = chars.len() - keep;
    let mut out = "*".repeat(hidden);
    out.extend(&chars[hidden..]);
    out
}
