//! Text rendering for album/song tables and gate button labels.

use crate::form::normalize_release_date;
use crate::gate::GateStatus;
use crate::types::{Album, Song};

const MISSING: &str = "\u{2014}";

/// `185` -> `"3:05"`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Button captions for one gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateLabels {
    pub idle: &'static str,
    pub armed: &'static str,
    pub pending: &'static str,
}

pub const DELETE_LABELS: GateLabels = GateLabels {
    idle: "Delete",
    armed: "Confirm",
    pending: "Deleting...",
};

pub const CREATE_ALBUM_LABELS: GateLabels = GateLabels {
    idle: "Create Album",
    armed: "Confirm",
    pending: "Saving...",
};

pub const UPDATE_ALBUM_LABELS: GateLabels = GateLabels {
    idle: "Update Album",
    armed: "Confirm",
    pending: "Saving...",
};

pub const CREATE_SONG_LABELS: GateLabels = GateLabels {
    idle: "Add Song",
    armed: "Confirm",
    pending: "Saving...",
};

pub const UPDATE_SONG_LABELS: GateLabels = GateLabels {
    idle: "Update Song",
    armed: "Confirm",
    pending: "Saving...",
};

/// Caption for the current gate state. Armed shows a check mark and the
/// seconds left, rounded up.
pub fn gate_label(labels: &GateLabels, status: GateStatus) -> String {
    match status {
        GateStatus::Idle => labels.idle.to_string(),
        GateStatus::Armed { remaining } => {
            let secs = remaining.as_millis().div_ceil(1000);
            format!("\u{2713} {} ({secs}s)", labels.armed)
        }
        GateStatus::Pending => labels.pending.to_string(),
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(pad_row(headers.iter().copied(), &widths));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        out.push(pad_row(row.iter().map(String::as_str), &widths));
    }
    out.join("\n")
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn format_albums_table(albums: &[Album]) -> String {
    if albums.is_empty() {
        return "No albums found".to_string();
    }
    let rows: Vec<Vec<String>> = albums
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.title.clone(),
                normalize_release_date(&a.release_date),
                a.songs.len().to_string(),
                a.coverart_url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .unwrap_or(MISSING)
                    .to_string(),
            ]
        })
        .collect();
    render_table(&["ID", "Title", "Release Date", "Songs", "Cover"], &rows)
}

pub fn format_songs_table(songs: &[Song]) -> String {
    if songs.is_empty() {
        return "No songs found".to_string();
    }
    let rows: Vec<Vec<String>> = songs
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.title.clone(),
                s.album_title.clone().unwrap_or_else(|| MISSING.to_string()),
                s.track_number.to_string(),
                format_duration(s.duration_seconds),
                yes_no(s.is_single).to_string(),
            ]
        })
        .collect();
    render_table(
        &["ID", "Title", "Album", "Track #", "Duration", "Single"],
        &rows,
    )
}
