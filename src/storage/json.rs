use crate::model::StorageError;
use crate::search::Search;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stores searches as JSON files in one directory.
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    /// Opens the storage directory, creating it when missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Writes the search record, replacing any previous file of that name.
    pub fn save_search(&self, name: &str, search: &Search) -> Result<PathBuf, StorageError> {
        let path = self.path_for(name);
        fs::write(&path, search.to_json()?)?;
        info!("Saved {} listings to {}", search.len(), path.display());
        Ok(path)
    }

    /// Loads a saved search. Returns `None` when no file of that name exists.
    pub fn load_search(&self, name: &str) -> Result<Option<Search>, StorageError> {
        let path = self.path_for(name);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let search = Search::from_json(&json)?;
        info!("Loaded {} listings from {}", search.len(), path.display());
        Ok(Some(search))
    }
}
