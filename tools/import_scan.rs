mod config;

use std::env;
use std::path::PathBuf;

use common::ProgressEvent;
use config::{config_path_from_env, load_or_create_config, resolve_music_root, resolve_path};
use library::{JsonFileStore, LibraryScanner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let mut args = env::args().skip(1);
    let music_root = args
        .next()
        .or_else(|| env::var("MUSIC_ROOT").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| resolve_music_root(&config_path, &config.music_root));
    let library_path = args
        .next()
        .or_else(|| env::var("LIBRARY_PATH").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| resolve_path(&config_path, &config.library_path));

    let mut store = JsonFileStore::new(library_path);
    if store.exists() {
        warn!("Replacing existing library at {:?}", store.path());
    }

    info!("Scanning {} for {}", music_root.display(), config.content_type);
    let scanner = LibraryScanner::local(config.follow_links)
        .with_content_type(config.content_type.as_str());
    let mut show_progress = |event: ProgressEvent| {
        eprintln!("[{:>3}%] {}", event.percent, event.message);
    };
    let summary = scanner.initialize_library(&music_root, &mut show_progress, &mut store)?;

    println!(
        "Indexed: {} artists, {} albums, {} tracks",
        summary.stats.artists, summary.stats.albums, summary.stats.tracks
    );
    if summary.skipped > 0 {
        println!("Skipped: {} unreadable files", summary.skipped);
    }

    Ok(())
}
