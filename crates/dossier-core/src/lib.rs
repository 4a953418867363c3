//! # dossier-core
//!
//! Core types, traits, and abstractions for the dossier library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other dossier crates depend on: the document/version/application
//! models, the error taxonomy, and the collaborator seams (text generation,
//! object storage).

pub mod defaults;
pub mod error;
pub mod labels;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
