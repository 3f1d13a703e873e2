use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// On-disk shape of the seen-set file.
#[derive(Debug, Serialize, Deserialize)]
struct SeenFile {
    apartments: Vec<String>,
    last_updated: String,
}

/// Persisted set of listing fingerprints. Append-only across runs: marking a
/// fingerprint means "never evaluate or notify on this listing again",
/// regardless of whether it matched.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    set: HashSet<String>,
}

impl SeenStore {
    /// Load from `path`. A missing or malformed file yields an empty set —
    /// losing history degrades to duplicate notifications, not to a failed run.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let set = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<SeenFile>(&text) {
                Ok(file) => file.apartments.into_iter().collect(),
                Err(e) => {
                    warn!("Seen-set file {} is malformed ({}), starting empty", path.display(), e);
                    HashSet::new()
                }
            },
            Err(_) => HashSet::new(),
        };
        SeenStore { path, set }
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.set.contains(fingerprint)
    }

    /// Idempotent insert.
    pub fn mark(&mut self, fingerprint: &str) {
        self.set.insert(fingerprint.to_string());
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Persist atomically: write a sibling temp file, then rename over the
    /// target. A crash mid-write leaves the previous file intact.
    pub fn save(&self) -> Result<()> {
        let mut apartments: Vec<String> = self.set.iter().cloned().collect();
        apartments.sort();
        let file = SeenFile {
            apartments,
            last_updated: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string(&file)?;

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, json)
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }

    /// Last-update timestamp as recorded on disk, if any.
    pub fn last_updated(path: &Path) -> Option<String> {
        let text = fs::read_to_string(path).ok()?;
        let file: SeenFile = serde_json::from_str(&text).ok()?;
        Some(file.last_updated)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::load(dir.path().join("nope.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "{not json").unwrap();
        let store = SeenStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");

        let mut store = SeenStore::load(&path);
        store.mark("abc");
        store.mark("def");
        store.mark("abc"); // idempotent
        assert_eq!(store.len(), 2);
        store.save().unwrap();

        let reloaded = SeenStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("abc"));
        assert!(reloaded.contains("def"));
        assert!(!reloaded.contains("xyz"));

        assert!(SeenStore::last_updated(&path).is_some());
    }

    #[test]
    fn save_replaces_without_leaving_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");

        let mut store = SeenStore::load(&path);
        store.mark("one");
        store.save().unwrap();
        store.mark("two");
        store.save().unwrap();

        let reloaded = SeenStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(!tmp_path(&path).exists());
    }
}
