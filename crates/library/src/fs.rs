use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

pub const AUDIO_MPEG: &str = "audio/mpeg";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub content_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub files: Vec<FileEntry>,
    pub folders: Vec<PathBuf>,
}

pub trait MusicFs {
    type Reader: Read + Seek;

    fn list_folder(&self, folder: &Path) -> io::Result<FolderListing>;

    fn open(&self, file: &Path) -> io::Result<Self::Reader>;
}

// Children are sorted by file name so both passes see the same order.
#[derive(Clone, Debug, Default)]
pub struct LocalFs {
    follow_links: bool,
}

impl LocalFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

impl MusicFs for LocalFs {
    type Reader = BufReader<File>;

    fn list_folder(&self, folder: &Path) -> io::Result<FolderListing> {
        let meta = fs::metadata(folder)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", folder.display()),
            ));
        }

        // A depth-1 walk cannot see ancestors, so loops through links are
        // detected here against the canonical path of the listed folder.
        let canonical = if self.follow_links {
            Some(fs::canonicalize(folder)?)
        } else {
            None
        };

        let mut listing = FolderListing::default();
        for entry in WalkDir::new(folder)
            .follow_links(self.follow_links)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    warn!("Skipping unreadable entry in {:?}: {}", folder, err);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if let Some(canonical) = &canonical {
                    if entry.path_is_symlink() && is_link_loop(canonical, entry.path()) {
                        continue;
                    }
                }
                listing.folders.push(entry.into_path());
            } else if file_type.is_file() {
                let path = entry.into_path();
                listing.files.push(FileEntry {
                    name: file_name(&path),
                    content_type: content_type(&path),
                    path,
                });
            }
        }

        Ok(listing)
    }

    fn open(&self, file: &Path) -> io::Result<Self::Reader> {
        File::open(file).map(BufReader::new)
    }
}

fn is_link_loop(canonical_parent: &Path, link: &Path) -> bool {
    match fs::canonicalize(link) {
        Ok(target) if canonical_parent.starts_with(&target) => {
            warn!("Skipping {:?}: links back to {:?}", link, target);
            true
        }
        Ok(_) => false,
        Err(err) => {
            warn!("Skipping unresolvable link {:?}: {}", link, err);
            true
        }
    }
}

pub(crate) fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;
    use std::path::Path;

    use super::{content_type, LocalFs, MusicFs, AUDIO_MPEG};

    #[test]
    fn guesses_mpeg_from_extension() {
        assert_eq!(content_type(Path::new("a/b/song.mp3")), AUDIO_MPEG);
        assert_eq!(content_type(Path::new("song.MP3")), AUDIO_MPEG);
        assert_ne!(content_type(Path::new("cover.jpg")), AUDIO_MPEG);
        assert_eq!(content_type(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn lists_files_and_folders_separately() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mp3"), b"b").unwrap();
        fs::write(dir.path().join("a.mp3"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("Zeta")).unwrap();
        fs::create_dir(dir.path().join("Alpha")).unwrap();
        fs::write(dir.path().join("Alpha").join("nested.mp3"), b"x").unwrap();

        let listing = LocalFs::new().list_folder(dir.path()).unwrap();

        let names: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3", "notes.txt"]);
        assert_eq!(listing.files[0].content_type, AUDIO_MPEG);
        assert_eq!(listing.files[2].content_type, "text/plain");
        assert_eq!(
            listing.folders,
            vec![dir.path().join("Alpha"), dir.path().join("Zeta")]
        );
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalFs::new().list_folder(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn file_is_not_a_folder() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("track.mp3");
        fs::write(&file, b"x").unwrap();
        assert!(LocalFs::new().list_folder(&file).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn followed_links_never_point_back_up() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join("elsewhere")).unwrap();
        std::os::unix::fs::symlink(root, root.join("sub").join("up")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("sub").join("self")).unwrap();
        std::os::unix::fs::symlink(root.join("elsewhere"), root.join("sub").join("side")).unwrap();

        let listing = LocalFs::new()
            .follow_links(true)
            .list_folder(&root.join("sub"))
            .unwrap();
        assert_eq!(listing.folders, vec![root.join("sub").join("side")]);

        let unfollowed = LocalFs::new().list_folder(&root.join("sub")).unwrap();
        assert!(unfollowed.folders.is_empty());
    }

    #[test]
    fn opens_files_for_reading() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("track.mp3");
        fs::write(&file, b"payload").unwrap();

        let mut reader = LocalFs::new().open(&file).unwrap();
        let mut body = String::new();
        reader.read_to_string(&mut body).unwrap();
        assert_eq!(body, "payload");
    }
}
