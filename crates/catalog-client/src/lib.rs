//! catalog-client: HTTP IO boundary for the catalog REST API.
//! Typed requests and responses, failure-to-message mapping. No view or gate
//! logic lives here.

pub mod api;
pub mod client;
pub mod error;

pub use api::CatalogApi;
pub use client::{CatalogClient, DEFAULT_API_URL, error_message};
pub use error::{ApiError, Operation};
