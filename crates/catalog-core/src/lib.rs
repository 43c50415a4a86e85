//! catalog-core: pure domain layer for the catalog admin client.
//! Entities and payloads, form validation, the confirmation gate state
//! machine, and text rendering. No IO, no async.

pub mod display;
pub mod error;
pub mod form;
pub mod gate;
pub mod types;

pub use error::{CatalogError, FormErrors};
pub use form::{AlbumDraft, SongDraft};
pub use gate::{
    ArmToken, Authorization, ConfirmationGate, DEFAULT_CONFIRM_TIMEOUT_MS, GatePhase, GateStatus,
    RequestOutcome,
};
pub use types::{Album, AlbumFormData, AlbumId, EntityKind, Song, SongFormData, SongId, Subject};
