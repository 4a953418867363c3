//! Core traits for dossier's external collaborators.
//!
//! These traits are the seams to everything outside the relational store:
//! the text generator and the object-store mirror. Concrete backends live in
//! `dossier-inference` and `dossier-db`; tests swap in fakes.

use async_trait::async_trait;

use crate::error::Result;

// =============================================================================
// TEXT GENERATION
// =============================================================================

/// Backend for text generation.
///
/// The engine treats generated text as opaque: it is never inspected beyond
/// requiring non-empty output. Failures surface as `Error::Generation`,
/// retryable by the caller; the engine never retries internally.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// OBJECT STORAGE
// =============================================================================

/// Storage backend trait for the version content mirror.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
/// Durability is guaranteed by the relational row; the mirror is a
/// convenience artifact, so callers log-and-swallow failures.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}
