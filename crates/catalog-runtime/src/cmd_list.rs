//! `catalog-admin albums` / `catalog-admin songs`: print one table and exit.

use catalog_client::CatalogApi;
use catalog_core::display::{format_albums_table, format_songs_table};

pub async fn cmd_albums(api: &dyn CatalogApi) -> anyhow::Result<()> {
    let albums = api
        .list_albums()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", format_albums_table(&albums));
    Ok(())
}

pub async fn cmd_songs(api: &dyn CatalogApi) -> anyhow::Result<()> {
    let songs = api
        .list_songs()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", format_songs_table(&songs));
    Ok(())
}
