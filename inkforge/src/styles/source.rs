use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use super::StyleDefinition;
use crate::Result;

/// Where style definitions come from.
pub trait StyleSource: Send + Sync {
    /// Reads the definition of `id`, `None` if there is no such style.
    fn fetch(&self, id: &str) -> Result<Option<StyleDefinition>>;

    /// Every id this source can fetch.
    fn ids(&self) -> Result<Vec<String>>;
}

/// Styles stored as `<id>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl StyleSource for DirectorySource {
    fn fetch(&self, id: &str) -> Result<Option<StyleDefinition>> {
        if !Self::is_valid_id(id) {
            return Ok(None);
        }

        let path = self.dir.join(format!("{id}.json"));
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && Self::is_valid_id(stem)
            {
                ids.push(stem.to_string());
            }
        }

        Ok(ids)
    }
}

/// Styles held in memory, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    styles: HashMap<String, StyleDefinition>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, definition: StyleDefinition) -> Self {
        self.styles.insert(id.to_string(), definition);
        self
    }
}

impl StyleSource for MemorySource {
    fn fetch(&self, id: &str) -> Result<Option<StyleDefinition>> {
        Ok(self.styles.get(id).cloned())
    }

    fn ids(&self) -> Result<Vec<String>> {
        Ok(self.styles.keys().cloned().collect())
    }
}
