use std::path::Path;

use common::{Catalog, ProgressEvent, ProgressSink, Track};
use metadata::{LoftyTagReader, TagInfo, TagReader};
use tracing::{debug, info, warn};

use crate::catalog::resolve_album;
use crate::fs::{FileEntry, FolderListing, LocalFs, MusicFs, AUDIO_MPEG};
use crate::store::CatalogStore;
use crate::{ImportSummary, LibraryError, LibraryStats};

pub const SCANNING_MESSAGE: &str = "Finding music files...";

// Both passes visit a folder's files before its subfolders, in listing order.
pub struct LibraryScanner<F, T> {
    fs: F,
    tags: T,
    content_type: String,
}

impl LibraryScanner<LocalFs, LoftyTagReader> {
    pub fn local(follow_links: bool) -> Self {
        Self::new(LocalFs::new().follow_links(follow_links), LoftyTagReader)
    }
}

impl<F: MusicFs, T: TagReader> LibraryScanner<F, T> {
    pub fn new(fs: F, tags: T) -> Self {
        Self {
            fs,
            tags,
            content_type: AUDIO_MPEG.to_string(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn count_files<S: ProgressSink>(
        &self,
        root: &Path,
        sink: &mut S,
    ) -> Result<usize, LibraryError> {
        let listing = self.list_root(root)?;
        let mut count = 0usize;
        self.count_listing(listing, &mut count, sink);
        info!("Found {} music files under {:?}", count, root);
        Ok(count)
    }

    pub fn import_files<S: ProgressSink>(
        &self,
        root: &Path,
        total: usize,
        catalog: &mut Catalog,
        sink: &mut S,
    ) -> Result<ImportSummary, LibraryError> {
        let listing = self.list_root(root)?;
        let mut summary = ImportSummary::default();
        self.import_listing(listing, total, catalog, &mut summary, sink);
        summary.stats = LibraryStats::from_catalog(catalog);
        info!(
            "Imported {} of {} files: {} artists, {} albums, {} tracks",
            summary.processed - summary.skipped,
            total,
            summary.stats.artists,
            summary.stats.albums,
            summary.stats.tracks
        );
        if summary.skipped > 0 || summary.tag_errors > 0 {
            warn!(
                "{} files skipped, {} files with unreadable tags",
                summary.skipped, summary.tag_errors
            );
        }
        Ok(summary)
    }

    pub fn build_catalog<S: ProgressSink>(
        &self,
        root: &Path,
        sink: &mut S,
    ) -> Result<(Catalog, ImportSummary), LibraryError> {
        sink.report(ProgressEvent::new(0, SCANNING_MESSAGE));
        let total = self.count_files(root, sink)?;
        let mut catalog = Catalog::new();
        let summary = self.import_files(root, total, &mut catalog, sink)?;
        Ok((catalog, summary))
    }

    pub fn initialize_library<S: ProgressSink, C: CatalogStore>(
        &self,
        root: &Path,
        sink: &mut S,
        store: &mut C,
    ) -> Result<ImportSummary, LibraryError> {
        let (catalog, summary) = self.build_catalog(root, sink)?;
        store.persist(&catalog)?;
        Ok(summary)
    }

    fn list_root(&self, root: &Path) -> Result<FolderListing, LibraryError> {
        self.fs
            .list_folder(root)
            .map_err(|err| LibraryError::RootUnavailable(root.to_path_buf(), err))
    }

    // Nested folders that cannot be listed are skipped by both passes.
    fn list_child(&self, folder: &Path) -> Option<FolderListing> {
        match self.fs.list_folder(folder) {
            Ok(listing) => Some(listing),
            Err(err) => {
                warn!("Failed to list {:?}: {}", folder, err);
                None
            }
        }
    }

    fn matches(&self, file: &FileEntry) -> bool {
        file.content_type == self.content_type
    }

    fn count_listing<S: ProgressSink>(
        &self,
        listing: FolderListing,
        count: &mut usize,
        sink: &mut S,
    ) {
        for _ in listing.files.iter().filter(|file| self.matches(file)) {
            *count += 1;
            sink.report(ProgressEvent::new(
                0,
                format!("{}{}", SCANNING_MESSAGE, count),
            ));
        }

        for folder in &listing.folders {
            if let Some(child) = self.list_child(folder) {
                self.count_listing(child, count, sink);
            }
        }
    }

    fn import_listing<S: ProgressSink>(
        &self,
        listing: FolderListing,
        total: usize,
        catalog: &mut Catalog,
        summary: &mut ImportSummary,
        sink: &mut S,
    ) {
        for file in listing.files.iter().filter(|file| self.matches(file)) {
            let event = self.import_file(file, total, catalog, summary);
            sink.report(event);
        }

        for folder in &listing.folders {
            if let Some(child) = self.list_child(folder) {
                self.import_listing(child, total, catalog, summary, sink);
            }
        }
    }

    fn import_file(
        &self,
        file: &FileEntry,
        total: usize,
        catalog: &mut Catalog,
        summary: &mut ImportSummary,
    ) -> ProgressEvent {
        let reader = match self.fs.open(&file.path) {
            Ok(reader) => reader,
            Err(err) => {
                warn!("Failed to open {:?}: {}", file.path, err);
                summary.processed += 1;
                summary.skipped += 1;
                return ProgressEvent::new(
                    percent_complete(summary.processed, total),
                    format!(
                        "Skipped {}: {} ({}/{})",
                        file.name, err, summary.processed, total
                    ),
                );
            }
        };

        let tags = match self.tags.read_tags(reader) {
            Ok(tags) => tags,
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", file.path, err);
                summary.tag_errors += 1;
                TagInfo::default()
            }
        };

        let album = resolve_album(catalog, &tags);
        album.tracks.push(Track {
            title: tags.title.clone(),
            number: tags.track_no,
        });
        debug!("Filed {:?} under album {:?}", file.path, album.name);

        summary.processed += 1;
        ProgressEvent::new(
            percent_complete(summary.processed, total),
            format!(
                "Importing {} - {} ({}/{})",
                tags.album, tags.title, summary.processed, total
            ),
        )
    }
}

// Rounds half away from zero; a zero total reports 0.
pub fn percent_complete(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (current as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}
