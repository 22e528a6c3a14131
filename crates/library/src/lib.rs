mod catalog;
mod fs;
mod scanner;
mod store;

use std::path::PathBuf;

use common::Catalog;
use serde::{Deserialize, Serialize};

pub use catalog::{resolve_album, resolve_artist_name, UNKNOWN_ARTIST};
pub use fs::{FileEntry, FolderListing, LocalFs, MusicFs, AUDIO_MPEG};
pub use scanner::{percent_complete, LibraryScanner, SCANNING_MESSAGE};
pub use store::{CatalogStore, JsonFileStore, DEFAULT_LIBRARY_FILE};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

impl LibraryStats {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            artists: catalog.artist_count(),
            albums: catalog.album_count(),
            tracks: catalog.track_count(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub stats: LibraryStats,
    // Includes skipped files.
    pub processed: usize,
    pub skipped: usize,
    pub tag_errors: usize,
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Json(serde_json::Error),
    RootUnavailable(PathBuf, std::io::Error),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Json(err) => write!(f, "json error: {}", err),
            LibraryError::RootUnavailable(path, err) => {
                write!(f, "music folder {} is unavailable: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Io(err) => Some(err),
            LibraryError::Json(err) => Some(err),
            LibraryError::RootUnavailable(_, err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Json(err)
    }
}
