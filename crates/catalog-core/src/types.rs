use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

pub type AlbumId = i64;
pub type SongId = i64;

// ─── Entities ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub release_date: String,
    #[serde(default)]
    pub coverart_url: Option<String>,
    #[serde(default)]
    pub songs: Vec<Song>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub duration_seconds: u32,
    pub track_number: u32,
    #[serde(deserialize_with = "bool_or_int")]
    pub is_single: bool,
    pub album_id: AlbumId,
    /// Joined by the list endpoint; absent on create/update responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
}

/// SQLite-backed APIs hand booleans back as `0`/`1`.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

// ─── Form payloads ────────────────────────────────────────────────

/// Body of `POST /albums` and `PUT /albums/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumFormData {
    pub title: String,
    pub release_date: String,
    pub coverart_url: Option<String>,
}

impl From<&Album> for AlbumFormData {
    fn from(album: &Album) -> Self {
        Self {
            title: album.title.clone(),
            release_date: album.release_date.clone(),
            coverart_url: album.coverart_url.clone(),
        }
    }
}

/// Body of `POST /songs` and `PUT /songs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFormData {
    pub title: String,
    pub duration_seconds: u32,
    pub track_number: u32,
    pub is_single: bool,
    pub album_id: AlbumId,
}

impl From<&Song> for SongFormData {
    fn from(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            duration_seconds: song.duration_seconds,
            track_number: song.track_number,
            is_single: song.is_single,
            album_id: song.album_id,
        }
    }
}

// ─── Response envelopes ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumsEnvelope {
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumEnvelope {
    pub album: Album,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongsEnvelope {
    pub songs: Vec<Song>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongEnvelope {
    pub song: Song,
}

/// Application-level error payload: `{ "error": "..." }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

// ─── Subject ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Album,
    Song,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Song => "song",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "album" | "albums" => Ok(Self::Album),
            "song" | "songs" => Ok(Self::Song),
            _ => Err(CatalogError::UnknownEntity(s.to_string())),
        }
    }
}

/// The entity an action targets. `New` stands for the create form of a kind,
/// which has no id until the server assigns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Existing { kind: EntityKind, id: i64 },
    New(EntityKind),
}

impl Subject {
    pub fn album(id: AlbumId) -> Self {
        Self::Existing {
            kind: EntityKind::Album,
            id,
        }
    }

    pub fn song(id: SongId) -> Self {
        Self::Existing {
            kind: EntityKind::Song,
            id,
        }
    }

    pub fn kind(self) -> EntityKind {
        match self {
            Self::Existing { kind, .. } | Self::New(kind) => kind,
        }
    }

    pub fn id(self) -> Option<i64> {
        match self {
            Self::Existing { id, .. } => Some(id),
            Self::New(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing { kind, id } => write!(f, "{kind} {id}"),
            Self::New(kind) => write!(f, "new {kind}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_accepts_integer_flag() {
        let song: Song = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Something",
            "duration_seconds": 182,
            "track_number": 2,
            "is_single": 1,
            "album_id": 3,
            "album_title": "Abbey Road",
        }))
        .expect("song");
        assert!(song.is_single);
        assert_eq!(song.album_title.as_deref(), Some("Abbey Road"));
    }

    #[test]
    fn album_tolerates_missing_songs_and_cover() {
        let album: Album = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Revolver",
            "release_date": "1966-08-05",
        }))
        .expect("album");
        assert!(album.songs.is_empty());
        assert!(album.coverart_url.is_none());
    }

    #[test]
    fn album_form_serializes_null_cover() {
        let form = AlbumFormData {
            title: "Help!".into(),
            release_date: "1965-08-06".into(),
            coverart_url: None,
        };
        let v = serde_json::to_value(&form).expect("json");
        assert!(v["coverart_url"].is_null());
    }

    #[test]
    fn entity_kind_parses_plural() {
        assert_eq!("Songs".parse::<EntityKind>().ok(), Some(EntityKind::Song));
        assert!("playlist".parse::<EntityKind>().is_err());
    }

    #[test]
    fn subject_display() {
        assert_eq!(Subject::song(42).to_string(), "song 42");
        assert_eq!(Subject::New(EntityKind::Album).to_string(), "new album");
        assert_eq!(Subject::album(3).id(), Some(3));
        assert_eq!(Subject::New(EntityKind::Song).id(), None);
    }
}
