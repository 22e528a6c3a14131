use std::io::{Read, Seek};

use lofty::config::ParseOptions;
use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};

/// Fields pulled from a file's tag. Missing values are empty strings and a
/// zero track number.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub title: String,
    pub track_no: u32,
    pub album: String,
    pub album_artist: String,
    pub artist: String,
    pub performer: String,
    pub composer: String,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Extracts tag fields from an open audio stream.
pub trait TagReader {
    fn read_tags<R: Read + Seek>(&self, reader: R) -> Result<TagInfo, MetadataError>;
}

/// [`TagReader`] backed by lofty. Prefers the ID3v2 tag, then whatever the
/// format considers its primary tag, then the first tag present.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags<R: Read + Seek>(&self, reader: R) -> Result<TagInfo, MetadataError> {
        read_tags(reader)
    }
}

pub fn read_tags<R: Read + Seek>(reader: R) -> Result<TagInfo, MetadataError> {
    let tagged_file = Probe::new(reader)
        .options(ParseOptions::new().read_properties(false))
        .guess_file_type()?
        .read()?;

    let tag = tagged_file
        .tag(TagType::Id3v2)
        .or_else(|| tagged_file.primary_tag())
        .or_else(|| tagged_file.first_tag());

    Ok(tag.map(tag_info).unwrap_or_default())
}

fn tag_info(tag: &Tag) -> TagInfo {
    TagInfo {
        title: first_value(tag, &ItemKey::TrackTitle),
        track_no: tag
            .get_string(&ItemKey::TrackNumber)
            .and_then(parse_track_no)
            .unwrap_or(0),
        album: first_value(tag, &ItemKey::AlbumTitle),
        album_artist: first_value(tag, &ItemKey::AlbumArtist),
        artist: first_value(tag, &ItemKey::TrackArtist),
        performer: first_value(tag, &ItemKey::Performer),
        composer: first_value(tag, &ItemKey::Composer),
    }
}

// ID3v2.4 packs multiple values into one frame separated by NUL.
fn first_value(tag: &Tag, key: &ItemKey) -> String {
    tag.get_string(key)
        .map(split_first)
        .unwrap_or_default()
        .to_string()
}

fn split_first(value: &str) -> &str {
    value.split('\0').next().unwrap_or(value)
}

fn parse_track_no(text: &str) -> Option<u32> {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use lofty::config::WriteOptions;
    use lofty::id3::v2::Id3v2Tag;
    use lofty::prelude::{Accessor, ItemKey, TagExt};
    use lofty::tag::{Tag, TagType};

    use super::{parse_track_no, split_first, LoftyTagReader, TagInfo, TagReader};

    // Three 128 kbps / 44.1 kHz layer III frames, enough to be detected as MPEG.
    fn mpeg_frames() -> Vec<u8> {
        let mut out = Vec::new();
        for _ in 0..3 {
            let mut frame = vec![0u8; 417];
            frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
            out.extend_from_slice(&frame);
        }
        out
    }

    fn id3v1(title: &str, artist: &str) -> Vec<u8> {
        fn field(value: &str, len: usize) -> Vec<u8> {
            let mut out = value.as_bytes().to_vec();
            out.resize(len, 0);
            out
        }
        let mut out = b"TAG".to_vec();
        out.extend(field(title, 30));
        out.extend(field(artist, 30));
        out.extend(field("", 30));
        out.extend(field("", 4));
        out.extend(field("", 30));
        out.push(255);
        out
    }

    fn id3v2(tag: Tag) -> Vec<u8> {
        let mut out = Vec::new();
        Id3v2Tag::from(tag)
            .dump_to(&mut out, WriteOptions::default())
            .unwrap();
        out
    }

    fn tagged() -> Tag {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_title("T1".to_string());
        tag.set_album("X".to_string());
        tag.set_artist("A".to_string());
        tag.set_track(3);
        tag.set_track_total(12);
        tag.insert_text(ItemKey::AlbumArtist, "Various".to_string());
        tag.insert_text(ItemKey::Composer, "Writer".to_string());
        tag
    }

    #[test]
    fn parses_plain_track_number() {
        assert_eq!(parse_track_no("7"), Some(7));
        assert_eq!(parse_track_no(" 12 "), Some(12));
    }

    #[test]
    fn parses_track_of_total() {
        assert_eq!(parse_track_no("3/12"), Some(3));
    }

    #[test]
    fn rejects_garbage_track_number() {
        assert_eq!(parse_track_no("A1"), None);
        assert_eq!(parse_track_no(""), None);
    }

    #[test]
    fn keeps_first_of_multiple_values() {
        assert_eq!(split_first("Alpha\0Beta"), "Alpha");
        assert_eq!(split_first("Solo"), "Solo");
        assert_eq!(split_first(""), "");
    }

    #[test]
    fn unknown_stream_is_an_error() {
        let reader = Cursor::new(b"definitely not an mpeg stream".to_vec());
        assert!(LoftyTagReader.read_tags(reader).is_err());
    }

    #[test]
    fn default_tag_info_is_empty() {
        let info = TagInfo::default();
        assert!(info.title.is_empty());
        assert!(info.album.is_empty());
        assert_eq!(info.track_no, 0);
    }

    #[test]
    fn reads_fields_from_id3v2() {
        let mut stream = id3v2(tagged());
        stream.extend(mpeg_frames());

        let info = LoftyTagReader.read_tags(Cursor::new(stream)).unwrap();
        assert_eq!(info.title, "T1");
        assert_eq!(info.album, "X");
        assert_eq!(info.artist, "A");
        assert_eq!(info.album_artist, "Various");
        assert_eq!(info.composer, "Writer");
        assert_eq!(info.performer, "");
        assert_eq!(info.track_no, 3);
    }

    #[test]
    fn multi_value_artist_keeps_the_first() {
        let mut tag = tagged();
        tag.set_artist("A\0B".to_string());
        let mut stream = id3v2(tag);
        stream.extend(mpeg_frames());

        let info = LoftyTagReader.read_tags(Cursor::new(stream)).unwrap();
        assert_eq!(info.artist, "A");
    }

    #[test]
    fn id3v2_wins_over_id3v1() {
        let mut stream = id3v2(tagged());
        stream.extend(mpeg_frames());
        stream.extend(id3v1("Old title", "Old artist"));

        let info = LoftyTagReader.read_tags(Cursor::new(stream)).unwrap();
        assert_eq!(info.title, "T1");
        assert_eq!(info.artist, "A");
    }

    #[test]
    fn falls_back_to_id3v1_alone() {
        let mut stream = mpeg_frames();
        stream.extend(id3v1("Old title", "Old artist"));

        let info = LoftyTagReader.read_tags(Cursor::new(stream)).unwrap();
        assert_eq!(info.title, "Old title");
        assert_eq!(info.artist, "Old artist");
        assert_eq!(info.track_no, 0);
    }

    #[test]
    fn untagged_stream_reads_as_empty() {
        let info = LoftyTagReader.read_tags(Cursor::new(mpeg_frames())).unwrap();
        assert_eq!(info, TagInfo::default());
    }
}
