//! CatalogApi trait: the REST surface the admin views depend on.
//! Enables fake injection for testing gates and views without a server.

use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::{Album, AlbumFormData, AlbumId, Song, SongFormData, SongId};

use crate::error::ApiError;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_albums(&self) -> Result<Vec<Album>, ApiError>;
    async fn create_album(&self, data: &AlbumFormData) -> Result<Album, ApiError>;
    async fn update_album(&self, id: AlbumId, data: &AlbumFormData) -> Result<Album, ApiError>;
    async fn delete_album(&self, id: AlbumId) -> Result<(), ApiError>;

    async fn list_songs(&self) -> Result<Vec<Song>, ApiError>;
    async fn create_song(&self, data: &SongFormData) -> Result<Song, ApiError>;
    async fn update_song(&self, id: SongId, data: &SongFormData) -> Result<Song, ApiError>;
    async fn delete_song(&self, id: SongId) -> Result<(), ApiError>;
}

#[async_trait]
impl<T: CatalogApi + ?Sized> CatalogApi for Arc<T> {
    async fn list_albums(&self) -> Result<Vec<Album>, ApiError> {
        (**self).list_albums().await
    }

    async fn create_album(&self, data: &AlbumFormData) -> Result<Album, ApiError> {
        (**self).create_album(data).await
    }

    async fn update_album(&self, id: AlbumId, data: &AlbumFormData) -> Result<Album, ApiError> {
        (**self).update_album(id, data).await
    }

    async fn delete_album(&self, id: AlbumId) -> Result<(), ApiError> {
        (**self).delete_album(id).await
    }

    async fn list_songs(&self) -> Result<Vec<Song>, ApiError> {
        (**self).list_songs().await
    }

    async fn create_song(&self, data: &SongFormData) -> Result<Song, ApiError> {
        (**self).create_song(data).await
    }

    async fn update_song(&self, id: SongId, data: &SongFormData) -> Result<Song, ApiError> {
        (**self).update_song(id, data).await
    }

    async fn delete_song(&self, id: SongId) -> Result<(), ApiError> {
        (**self).delete_song(id).await
    }
}
