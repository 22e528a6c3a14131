use common::{Album, Artist, Catalog};
use metadata::TagInfo;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

pub fn resolve_artist_name(tags: &TagInfo) -> &str {
    [
        tags.album_artist.as_str(),
        tags.artist.as_str(),
        tags.performer.as_str(),
        tags.composer.as_str(),
    ]
    .into_iter()
    .find(|name| !name.is_empty())
    .unwrap_or(UNKNOWN_ARTIST)
}

// Album names match as-is; an empty album tag gets its own empty-named album.
pub fn resolve_album<'a>(catalog: &'a mut Catalog, tags: &TagInfo) -> &'a mut Album {
    let artist_name = resolve_artist_name(tags);

    let artist_idx = match catalog
        .artists
        .iter()
        .position(|artist| artist.name == artist_name)
    {
        Some(idx) => idx,
        None => {
            catalog.artists.push(Artist::new(artist_name));
            catalog.artists.len() - 1
        }
    };
    let artist = &mut catalog.artists[artist_idx];

    let album_idx = match artist
        .albums
        .iter()
        .position(|album| album.name == tags.album)
    {
        Some(idx) => idx,
        None => {
            artist.albums.push(Album::new(tags.album.as_str()));
            artist.albums.len() - 1
        }
    };

    &mut artist.albums[album_idx]
}
