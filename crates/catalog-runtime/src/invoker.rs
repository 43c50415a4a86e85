//! Action invoker: performs the single network effect a confirmed gate
//! authorizes and folds every failure into one user-facing message.

use catalog_client::CatalogApi;
use catalog_core::{AlbumFormData, AlbumId, EntityKind, SongFormData, SongId, Subject};
use thiserror::Error;

/// A gated, side-effecting catalog call together with the payload captured
/// for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateAlbum(AlbumFormData),
    UpdateAlbum(AlbumId, AlbumFormData),
    DeleteAlbum(AlbumId),
    CreateSong(SongFormData),
    UpdateSong(SongId, SongFormData),
    DeleteSong(SongId),
}

impl Action {
    pub fn subject(&self) -> Subject {
        match self {
            Self::CreateAlbum(_) => Subject::New(EntityKind::Album),
            Self::UpdateAlbum(id, _) | Self::DeleteAlbum(id) => Subject::album(*id),
            Self::CreateSong(_) => Subject::New(EntityKind::Song),
            Self::UpdateSong(id, _) | Self::DeleteSong(id) => Subject::song(*id),
        }
    }

    /// Lists that go stale when this action succeeds. Deleting an album
    /// also deletes its songs on the server.
    pub fn refresh_scopes(&self) -> &'static [RefreshScope] {
        match self {
            Self::CreateAlbum(_) | Self::UpdateAlbum(..) => &[RefreshScope::Albums],
            Self::DeleteAlbum(_) => &[RefreshScope::Albums, RefreshScope::Songs],
            Self::CreateSong(_) | Self::UpdateSong(..) | Self::DeleteSong(_) => {
                &[RefreshScope::Songs]
            }
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::CreateAlbum(_) | Self::CreateSong(_) => "create",
            Self::UpdateAlbum(..) | Self::UpdateSong(..) => "update",
            Self::DeleteAlbum(_) | Self::DeleteSong(_) => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshScope {
    Albums,
    Songs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSuccess {
    pub subject: Subject,
    pub refresh: &'static [RefreshScope],
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionFailure {
    pub subject: Subject,
    pub message: String,
}

pub type ActionResult = Result<ActionSuccess, ActionFailure>;

/// Run `action` exactly once. No retries: a failure is terminal for this
/// invocation.
pub async fn invoke(api: &dyn CatalogApi, action: &Action) -> ActionResult {
    let subject = action.subject();
    tracing::debug!(%subject, verb = action.verb(), "invoking catalog action");

    let outcome = match action {
        Action::CreateAlbum(data) => api
            .create_album(data)
            .await
            .map(|a| format!("album {} created: {}", a.id, a.title)),
        Action::UpdateAlbum(id, data) => api
            .update_album(*id, data)
            .await
            .map(|a| format!("album {} updated: {}", a.id, a.title)),
        Action::DeleteAlbum(id) => api
            .delete_album(*id)
            .await
            .map(|()| format!("album {id} deleted")),
        Action::CreateSong(data) => api
            .create_song(data)
            .await
            .map(|s| format!("song {} created: {}", s.id, s.title)),
        Action::UpdateSong(id, data) => api
            .update_song(*id, data)
            .await
            .map(|s| format!("song {} updated: {}", s.id, s.title)),
        Action::DeleteSong(id) => api
            .delete_song(*id)
            .await
            .map(|()| format!("song {id} deleted")),
    };

    match outcome {
        Ok(summary) => Ok(ActionSuccess {
            subject,
            refresh: action.refresh_scopes(),
            summary,
        }),
        Err(e) => {
            tracing::warn!(%subject, error = %e, "catalog action failed");
            Err(ActionFailure {
                subject,
                message: e.user_message(),
            })
        }
    }
}
