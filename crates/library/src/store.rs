use std::fs;
use std::path::{Path, PathBuf};

use common::Catalog;
use tracing::info;

use crate::LibraryError;

pub const DEFAULT_LIBRARY_FILE: &str = "library.json";

pub trait CatalogStore {
    fn persist(&mut self, catalog: &Catalog) -> Result<(), LibraryError>;
}

#[derive(Clone, Debug)]
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

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl CatalogStore for JsonFileStore {
    fn persist(&mut self, catalog: &Catalog) -> Result<(), LibraryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(catalog)?;
        fs::write(&self.path, bytes)?;
        info!("Wrote library to {:?}", self.path);
        Ok(())
    }
}
