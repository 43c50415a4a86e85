//! Album and song form drafts: raw text as typed by the user, validated into
//! the payloads the API accepts.
//!
//! Only required-field checks and number parsing happen here; anything else
//! (date ranges, URL shape, duplicate titles) is left to the server.

use chrono::DateTime;

use crate::error::FormErrors;
use crate::types::{Album, AlbumFormData, Song, SongFormData};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumDraft {
    pub title: String,
    pub release_date: String,
    pub coverart_url: String,
}

impl AlbumDraft {
    /// Pre-fill the edit form from an existing album.
    pub fn from_album(album: &Album) -> Self {
        Self {
            title: album.title.clone(),
            release_date: normalize_release_date(&album.release_date),
            coverart_url: album.coverart_url.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<AlbumFormData, FormErrors> {
        let mut errors = FormErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        let release_date = normalize_release_date(&self.release_date);
        if release_date.is_empty() {
            errors.push("release_date", "Release date is required");
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let cover = self.coverart_url.trim();
        Ok(AlbumFormData {
            title: self.title.clone(),
            release_date,
            coverart_url: (!cover.is_empty()).then(|| cover.to_string()),
        })
    }
}

/// Reduce a stored release date to the `YYYY-MM-DD` form a date input shows.
///
/// ```text
/// "1969-09-26T00:00:00.000Z" -> "1969-09-26"
/// "1969-09-26"               -> "1969-09-26"
/// ```
pub fn normalize_release_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.date_naive().format("%Y-%m-%d").to_string();
    }
    match raw.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => raw.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongDraft {
    pub title: String,
    pub duration_seconds: String,
    pub track_number: String,
    pub is_single: bool,
    pub album_id: String,
}

impl SongDraft {
    pub fn from_song(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            duration_seconds: song.duration_seconds.to_string(),
            track_number: song.track_number.to_string(),
            is_single: song.is_single,
            album_id: song.album_id.to_string(),
        }
    }

    pub fn validate(&self) -> Result<SongFormData, FormErrors> {
        let mut errors = FormErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        let duration_seconds = parse_required(
            &mut errors,
            "duration_seconds",
            "Duration",
            &self.duration_seconds,
        );
        let track_number =
            parse_required(&mut errors, "track_number", "Track number", &self.track_number);
        let album_id = if self.album_id.trim().is_empty() {
            errors.push("album_id", "Album is required");
            None
        } else {
            match self.album_id.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("album_id", "Album must be a number");
                    None
                }
            }
        };

        match (duration_seconds, track_number, album_id) {
            (Some(duration_seconds), Some(track_number), Some(album_id)) if errors.is_empty() => {
                Ok(SongFormData {
                    title: self.title.clone(),
                    duration_seconds,
                    track_number,
                    is_single: self.is_single,
                    album_id,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_required(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(field, format!("{label} is required"));
        return None;
    }
    match raw.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(field, format!("{label} must be a number"));
            None
        }
    }
}
