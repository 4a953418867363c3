//! Object-store mirror for version content.
//!
//! Every persisted version is mirrored outside the relational store as a
//! plain markdown file. The relational row is the source of truth; mirror
//! failures are logged and swallowed, never surfaced to the caller.
//!
//! Path scheme: `users/{user_id}/{family}/{document_id}/versions/{label}.md`

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use dossier_core::{DocumentKind, Error, Result, StorageBackend};

/// Filesystem storage backend.
///
/// Stores mirrored content under a base directory, creating parent
/// directories on demand.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.md");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "write",
            storage_path = %path,
            size = data.len(),
            "mirror write"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create_dir_all failed: {}", e)))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| Error::Storage(format!("write {} failed: {}", path, e)))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.full_path(path))
            .await
            .map_err(|e| Error::Storage(format!("read {} failed: {}", path, e)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        fs::remove_file(self.full_path(path))
            .await
            .map_err(|e| Error::Storage(format!("delete {} failed: {}", path, e)))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::metadata(self.full_path(path)).await.is_ok())
    }
}

/// Fire-and-forget mirror of version content to an object store.
#[derive(Clone)]
pub struct VersionMirror {
    backend: Arc<dyn StorageBackend>,
}

impl VersionMirror {
    /// Create a mirror over the given backend.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Mirror path for a version.
    pub fn version_path(
        user_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
        label: &str,
    ) -> String {
        format!(
            "users/{}/{}/{}/versions/{}.md",
            user_id,
            kind.storage_segment(),
            document_id,
            label
        )
    }

    /// Save version content, logging and swallowing any failure.
    pub async fn save_version(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        document_id: Uuid,
        label: &str,
        content: &str,
    ) {
        let path = Self::version_path(user_id, kind, document_id, label);
        if let Err(e) = self.backend.write(&path, content.as_bytes()).await {
            warn!(
                subsystem = "storage",
                component = "mirror",
                op = "save_version",
                document_id = %document_id,
                storage_path = %path,
                error = %e,
                "Failed to mirror version content"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_path_scheme() {
        let user = Uuid::nil();
        let doc = Uuid::nil();
        let path = VersionMirror::version_path(user, DocumentKind::Resume, doc, "v2 - Acme");
        assert_eq!(
            path,
            format!("users/{}/resumes/{}/versions/v2 - Acme.md", user, doc)
        );
    }

    #[test]
    fn test_cover_letter_segment() {
        let path =
            VersionMirror::version_path(Uuid::nil(), DocumentKind::CoverLetter, Uuid::nil(), "v1");
        assert!(path.contains("/cover_letters/"));
    }

    #[tokio::test]
    async fn test_filesystem_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        backend.validate().await.expect("validate should pass");

        backend.write("a/b/c.md", b"hello").await.unwrap();
        assert!(backend.exists("a/b/c.md").await.unwrap());
        assert_eq!(backend.read("a/b/c.md").await.unwrap(), b"hello");

        backend.delete("a/b/c.md").await.unwrap();
        assert!(!backend.exists("a/b/c.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_mirror_swallows_failures() {
        // Point at a path that cannot be created (file used as directory).
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("users");
        tokio::fs::write(&blocker, b"not a dir").await.unwrap();

        let mirror = VersionMirror::new(FilesystemBackend::new(dir.path()));
        // Must not panic or error.
        mirror
            .save_version(Uuid::nil(), DocumentKind::Resume, Uuid::nil(), "v1", "x")
            .await;
    }
}
