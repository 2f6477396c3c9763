//! VIVARIA Core — domain models, the terrarium compatibility engine,
//! and repository trait definitions shared across all crates.

pub mod compat;
pub mod error;
pub mod models;
pub mod repository;

pub use error::{VivariaError, VivariaResult};
