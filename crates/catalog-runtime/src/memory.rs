//! In-memory [`CatalogApi`] for tests and offline demos.
//!
//! Records every call, can simulate server latency (honours tokio's paused
//! clock) and can be told to reject the next call.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use catalog_client::{ApiError, CatalogApi, Operation};
use catalog_core::{Album, AlbumFormData, AlbumId, Song, SongFormData, SongId};

#[derive(Debug, Default)]
struct Inner {
    albums: Vec<Album>,
    songs: Vec<Song>,
    next_id: i64,
    calls: Vec<String>,
    /// Status and optional `{ error }` body for the next call.
    fail_next: Option<(u16, Option<String>)>,
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: Mutex<Inner>,
    latency: Duration,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn with_album(self, title: &str, release_date: &str) -> Self {
        {
            let mut inner = self.lock();
            let id = inner.next_id();
            inner.albums.push(Album {
                id,
                title: title.to_string(),
                release_date: release_date.to_string(),
                coverart_url: None,
                songs: Vec::new(),
            });
        }
        self
    }

    #[must_use]
    pub fn with_song(self, id: SongId, title: &str, album_id: AlbumId) -> Self {
        {
            let mut inner = self.lock();
            inner.next_id = inner.next_id.max(id);
            inner.songs.push(Song {
                id,
                title: title.to_string(),
                duration_seconds: 180,
                track_number: 1,
                is_single: false,
                album_id,
                album_title: None,
            });
        }
        self
    }

    /// Reject the next call with `status`; `error` becomes the `{ error }`
    /// body, `None` leaves the body empty.
    pub fn fail_next(&self, status: u16, error: Option<&str>) {
        self.lock().fail_next = Some((status, error.map(String::from)));
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn song_ids(&self) -> Vec<SongId> {
        self.lock().songs.iter().map(|s| s.id).collect()
    }

    pub fn album_ids(&self) -> Vec<AlbumId> {
        self.lock().albums.iter().map(|a| a.id).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, wait out the configured latency, then either
    /// consume an injected failure or run `apply`.
    async fn call<T>(
        &self,
        op: Operation,
        label: String,
        apply: impl FnOnce(&mut Inner) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        self.lock().calls.push(label);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut inner = self.lock();
        if let Some((status, error)) = inner.fail_next.take() {
            return Err(ApiError::Rejected {
                status,
                message: error.unwrap_or_else(|| op.failure_message().to_string()),
            });
        }
        apply(&mut inner)
    }
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Rejected {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    fn album_title(&self, album_id: AlbumId) -> Option<String> {
        self.albums
            .iter()
            .find(|a| a.id == album_id)
            .map(|a| a.title.clone())
    }
}

#[async_trait]
impl CatalogApi for MemoryCatalog {
    async fn list_albums(&self) -> Result<Vec<Album>, ApiError> {
        self.call(Operation::ListAlbums, "GET /albums".into(), |inner| {
            let albums = inner
                .albums
                .iter()
                .map(|a| Album {
                    songs: inner
                        .songs
                        .iter()
                        .filter(|s| s.album_id == a.id)
                        .cloned()
                        .collect(),
                    ..a.clone()
                })
                .collect();
            Ok(albums)
        })
        .await
    }

    async fn create_album(&self, data: &AlbumFormData) -> Result<Album, ApiError> {
        self.call(Operation::CreateAlbum, "POST /albums".into(), |inner| {
            let album = Album {
                id: inner.next_id(),
                title: data.title.clone(),
                release_date: data.release_date.clone(),
                coverart_url: data.coverart_url.clone(),
                songs: Vec::new(),
            };
            inner.albums.push(album.clone());
            Ok(album)
        })
        .await
    }

    async fn update_album(&self, id: AlbumId, data: &AlbumFormData) -> Result<Album, ApiError> {
        self.call(Operation::UpdateAlbum, format!("PUT /albums/{id}"), |inner| {
            let album = inner
                .albums
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| Inner::not_found("Album"))?;
            album.title = data.title.clone();
            album.release_date = data.release_date.clone();
            album.coverart_url = data.coverart_url.clone();
            Ok(album.clone())
        })
        .await
    }

    async fn delete_album(&self, id: AlbumId) -> Result<(), ApiError> {
        self.call(Operation::DeleteAlbum, format!("DELETE /albums/{id}"), |inner| {
            let before = inner.albums.len();
            inner.albums.retain(|a| a.id != id);
            if inner.albums.len() == before {
                return Err(Inner::not_found("Album"));
            }
            inner.songs.retain(|s| s.album_id != id);
            Ok(())
        })
        .await
    }

    async fn list_songs(&self) -> Result<Vec<Song>, ApiError> {
        self.call(Operation::ListSongs, "GET /songs".into(), |inner| {
            let songs = inner
                .songs
                .iter()
                .map(|s| Song {
                    album_title: inner.album_title(s.album_id),
                    ..s.clone()
                })
                .collect();
            Ok(songs)
        })
        .await
    }

    async fn create_song(&self, data: &SongFormData) -> Result<Song, ApiError> {
        self.call(Operation::CreateSong, "POST /songs".into(), |inner| {
            if inner.album_title(data.album_id).is_none() {
                return Err(Inner::not_found("Album"));
            }
            let song = Song {
                id: inner.next_id(),
                title: data.title.clone(),
                duration_seconds: data.duration_seconds,
                track_number: data.track_number,
                is_single: data.is_single,
                album_id: data.album_id,
                album_title: None,
            };
            inner.songs.push(song.clone());
            Ok(song)
        })
        .await
    }

    async fn update_song(&self, id: SongId, data: &SongFormData) -> Result<Song, ApiError> {
        self.call(Operation::UpdateSong, format!("PUT /songs/{id}"), |inner| {
            let song = inner
                .songs
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| Inner::not_found("Song"))?;
            song.title = data.title.clone();
            song.duration_seconds = data.duration_seconds;
            song.track_number = data.track_number;
            song.is_single = data.is_single;
            song.album_id = data.album_id;
            Ok(song.clone())
        })
        .await
    }

    async fn delete_song(&self, id: SongId) -> Result<(), ApiError> {
        self.call(Operation::DeleteSong, format!("DELETE /songs/{id}"), |inner| {
            let before = inner.songs.len();
            inner.songs.retain(|s| s.id != id);
            if inner.songs.len() == before {
                return Err(Inner::not_found("Song"));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_and_list() {
        let api = MemoryCatalog::new()
            .with_album("Revolver", "1966-08-05")
            .with_song(42, "Taxman", 1);
        api.delete_song(42).await.expect("deleted");
        assert!(api.list_songs().await.expect("songs").is_empty());
        assert_eq!(api.calls(), vec!["DELETE /songs/42", "GET /songs"]);
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let api = MemoryCatalog::new().with_song(42, "Taxman", 1);
        api.fail_next(500, None);
        let err = api.delete_song(42).await.unwrap_err();
        assert_eq!(err.user_message(), "Failed to delete song");
        api.delete_song(42).await.expect("second attempt succeeds");
    }

    #[tokio::test]
    async fn songs_list_joins_album_title() {
        let api = MemoryCatalog::new()
            .with_album("Revolver", "1966-08-05")
            .with_song(7, "Taxman", 1);
        let songs = api.list_songs().await.expect("songs");
        assert_eq!(songs[0].album_title.as_deref(), Some("Revolver"));
        let albums = api.list_albums().await.expect("albums");
        assert_eq!(albums[0].songs.len(), 1);
    }
}
