//! CatalogClient: reqwest-backed implementation of [`CatalogApi`].

use std::time::Duration;

use async_trait::async_trait;
use catalog_core::types::{
    AlbumEnvelope, AlbumsEnvelope, ErrorBody, SongEnvelope, SongsEnvelope,
};
use catalog_core::{Album, AlbumFormData, AlbumId, Song, SongFormData, SongId};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::api::CatalogApi;
use crate::error::{ApiError, Operation};

/// Address the admin talks to when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8787";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, op: Operation, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = req
            .send()
            .await
            .map_err(|source| ApiError::Transport { op, source })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| op.failure_message().to_string());
        tracing::warn!(?op, status = status.as_u16(), %message, "catalog request rejected");
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        op: Operation,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(op, req).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { op, source })?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            op,
            detail: e.to_string(),
        })
    }
}

/// Pull `{ "error": "..." }` out of a failure body. Blank or missing
/// messages yield `None` so the caller falls back to a fixed message.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty())
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list_albums(&self) -> Result<Vec<Album>, ApiError> {
        let op = Operation::ListAlbums;
        let env: AlbumsEnvelope = self.send_json(op, self.request(Method::GET, "/albums")).await?;
        Ok(env.albums)
    }

    async fn create_album(&self, data: &AlbumFormData) -> Result<Album, ApiError> {
        let op = Operation::CreateAlbum;
        let req = self.request(Method::POST, "/albums").json(data);
        let env: AlbumEnvelope = self.send_json(op, req).await?;
        tracing::info!(album_id = env.album.id, "album created");
        Ok(env.album)
    }

    async fn update_album(&self, id: AlbumId, data: &AlbumFormData) -> Result<Album, ApiError> {
        let op = Operation::UpdateAlbum;
        let req = self.request(Method::PUT, &format!("/albums/{id}")).json(data);
        let env: AlbumEnvelope = self.send_json(op, req).await?;
        Ok(env.album)
    }

    async fn delete_album(&self, id: AlbumId) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/albums/{id}"));
        self.send(Operation::DeleteAlbum, req).await?;
        tracing::info!(album_id = id, "album deleted");
        Ok(())
    }

    async fn list_songs(&self) -> Result<Vec<Song>, ApiError> {
        let op = Operation::ListSongs;
        let env: SongsEnvelope = self.send_json(op, self.request(Method::GET, "/songs")).await?;
        Ok(env.songs)
    }

    async fn create_song(&self, data: &SongFormData) -> Result<Song, ApiError> {
        let op = Operation::CreateSong;
        let req = self.request(Method::POST, "/songs").json(data);
        let env: SongEnvelope = self.send_json(op, req).await?;
        tracing::info!(song_id = env.song.id, "song created");
        Ok(env.song)
    }

    async fn update_song(&self, id: SongId, data: &SongFormData) -> Result<Song, ApiError> {
        let op = Operation::UpdateSong;
        let req = self.request(Method::PUT, &format!("/songs/{id}")).json(data);
        let env: SongEnvelope = self.send_json(op, req).await?;
        Ok(env.song)
    }

    async fn delete_song(&self, id: SongId) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/songs/{id}"));
        self.send(Operation::DeleteSong, req).await?;
        tracing::info!(song_id = id, "song deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn album_json(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "release_date": "1969-09-26",
            "coverart_url": null,
            "songs": [],
        })
    }

    fn song_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Come Together",
            "duration_seconds": 259,
            "track_number": 1,
            "is_single": true,
            "album_id": 1,
        })
    }

    #[test]
    fn trims_trailing_slash() {
        let client = CatalogClient::new("http://localhost:8787/").expect("client");
        assert_eq!(client.base_url(), "http://localhost:8787");
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":"Song not found"}"#).as_deref(),
            Some("Song not found")
        );
        assert_eq!(error_message(r#"{"error":"  "}"#), None);
        assert_eq!(error_message(r#"{"message":"nope"}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(""), None);
    }

    #[tokio::test]
    async fn list_albums_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/albums"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "albums": [album_json(1, "Abbey Road"), album_json(2, "Revolver")],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let albums = client.list_albums().await.expect("albums");
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[1].title, "Revolver");
    }

    #[tokio::test]
    async fn create_album_posts_form() {
        let server = MockServer::start().await;
        let form = AlbumFormData {
            title: "Abbey Road".into(),
            release_date: "1969-09-26".into(),
            coverart_url: None,
        };
        Mock::given(method("POST"))
            .and(path("/albums"))
            .and(body_json(json!({
                "title": "Abbey Road",
                "release_date": "1969-09-26",
                "coverart_url": null,
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "album": album_json(7, "Abbey Road") })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let album = client.create_album(&form).await.expect("album");
        assert_eq!(album.id, 7);
    }

    #[tokio::test]
    async fn update_album_uses_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/albums/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "album": album_json(3, "Help!") })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let form = AlbumFormData {
            title: "Help!".into(),
            release_date: "1965-08-06".into(),
            coverart_url: Some("https://img/help.jpg".into()),
        };
        let album = client.update_album(3, &form).await.expect("album");
        assert_eq!(album.title, "Help!");
    }

    #[tokio::test]
    async fn delete_album_without_body_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/albums/5"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let err = client.delete_album(5).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "Failed to delete album");
    }

    #[tokio::test]
    async fn delete_song_success_ignores_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/songs/42"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        client.delete_song(42).await.expect("deleted");
    }

    #[tokio::test]
    async fn delete_song_surfaces_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/songs/42"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "Song not found" })),
            )
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let err = client.delete_song(42).await.unwrap_err();
        assert_eq!(err.user_message(), "Song not found");
    }

    #[tokio::test]
    async fn list_songs_bad_shape_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/songs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let err = client.list_songs().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { op: Operation::ListSongs, .. }));
        assert_eq!(err.user_message(), "Failed to fetch songs");
    }

    #[tokio::test]
    async fn create_and_update_song() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/songs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "song": song_json(11) })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/songs/11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "song": song_json(11) })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CatalogClient::new(&server.uri()).expect("client");
        let form = SongFormData {
            title: "Come Together".into(),
            duration_seconds: 259,
            track_number: 1,
            is_single: true,
            album_id: 1,
        };
        assert_eq!(client.create_song(&form).await.expect("song").id, 11);
        assert_eq!(client.update_song(11, &form).await.expect("song").id, 11);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = CatalogClient::new("http://127.0.0.1:9").expect("client");
        let err = client.list_albums().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert_eq!(err.user_message(), "Failed to fetch albums");
    }
}
