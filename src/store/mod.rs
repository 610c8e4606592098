//! Saved-adverts store
//!
//! A small JSON-backed list of advert ids the user has saved, with explicit
//! load/save and typed accessors. De-duplicates and keeps insertion order.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedFile {
    advert_ids: Vec<String>,
}

/// Saved-items list bound to its backing file.
#[derive(Debug)]
pub struct SavedItems {
    ids: Vec<String>,
    path: PathBuf,
}

impl SavedItems {
    fn data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "petmarket", "petmarket-cli")
            .context("Could not determine data directory")?;
        Ok(proj_dirs.data_dir().join("saved.json"))
    }

    /// Load the saved list from the default data directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::data_path()?)
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read saved items")?;
            let file: SavedFile =
                serde_json::from_str(&content).context("Failed to parse saved items")?;
            file.advert_ids
        } else {
            Vec::new()
        };
        Ok(Self { ids, path })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }
        let file = SavedFile {
            advert_ids: self.ids.clone(),
        };
        let content =
            serde_json::to_string_pretty(&file).context("Failed to serialize saved items")?;
        fs::write(&self.path, content).context("Failed to write saved items")
    }

    /// Add an advert id. Returns false if it was already saved.
    pub fn add(&mut self, advert_id: &str) -> bool {
        if self.contains(advert_id) {
            return false;
        }
        self.ids.push(advert_id.to_string());
        true
    }

    /// Remove an advert id. Returns false if it was not saved.
    pub fn remove(&mut self, advert_id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| id != advert_id);
        self.ids.len() != before
    }

    pub fn contains(&self, advert_id: &str) -> bool {
        self.ids.iter().any(|id| id == advert_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");

        let mut saved = SavedItems::load_from(&path).unwrap();
        assert!(saved.is_empty());
        assert!(saved.add("ad-1"));
        assert!(saved.add("ad-2"));
        assert!(!saved.add("ad-1")); // duplicate
        saved.save().unwrap();

        let mut reloaded = SavedItems::load_from(&path).unwrap();
        assert_eq!(reloaded.ids(), &["ad-1", "ad-2"]);
        assert!(reloaded.contains("ad-2"));

        assert!(reloaded.remove("ad-1"));
        assert!(!reloaded.remove("ad-1"));
        reloaded.save().unwrap();

        let final_state = SavedItems::load_from(&path).unwrap();
        assert_eq!(final_state.ids(), &["ad-2"]);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let saved = SavedItems::load_from(dir.path().join("nope.json")).unwrap();
        assert!(saved.is_empty());
    }
}
