//! Error types for the VIVARIA system.

use thiserror::Error;

use crate::compat::BiomeConflict;

#[derive(Debug, Error)]
pub enum VivariaError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Hard rejection from the compatibility engine: the candidate's
    /// biome does not match the terrarium's current occupants. Carries
    /// the full diagnostic payload for the caller to render.
    #[error("Biome conflict: {0}")]
    BiomeConflict(BiomeConflict),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VivariaResult<T> = Result<T, VivariaError>;
