//! Error types for the catalog REST client.

use thiserror::Error;

/// Which API call failed; supplies the fallback message shown when the
/// server gives no `{ error }` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListAlbums,
    CreateAlbum,
    UpdateAlbum,
    DeleteAlbum,
    ListSongs,
    CreateSong,
    UpdateSong,
    DeleteSong,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::ListAlbums => "Failed to fetch albums",
            Self::CreateAlbum => "Failed to create album",
            Self::UpdateAlbum => "Failed to update album",
            Self::DeleteAlbum => "Failed to delete album",
            Self::ListSongs => "Failed to fetch songs",
            Self::CreateSong => "Failed to create song",
            Self::UpdateSong => "Failed to update song",
            Self::DeleteSong => "Failed to delete song",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{}: {source}", .op.failure_message())]
    Transport {
        op: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error("{}: invalid response body: {detail}", .op.failure_message())]
    Decode { op: Operation, detail: String },
}

impl ApiError {
    /// The single human-readable line shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => format!("HTTP client unavailable: {e}"),
            Self::Transport { op, .. } | Self::Decode { op, .. } => {
                op.failure_message().to_string()
            }
            Self::Rejected { message, .. } => message.clone(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
