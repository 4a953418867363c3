//! # dossier-db
//!
//! PostgreSQL database layer for dossier.
//!
//! This crate provides:
//! - Connection pool management
//! - Repositories for master documents, versions, and applications
//! - An optional object-store mirror for version content
//!
//! ## Example
//!
//! ```rust,ignore
//! use dossier_db::Database;
//! use dossier_core::{CreateDocumentRequest, DocumentKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/dossier").await?;
//!
//!     let (resume, v1) = db
//!         .documents(DocumentKind::Resume)
//!         .create_with_initial_version(CreateDocumentRequest {
//!             user_id: owner,
//!             title: "Backend Engineer".to_string(),
//!             content: "# Jane Doe\n...".to_string(),
//!             is_default: false,
//!         })
//!         .await?;
//!
//!     println!("Created resume {} at {}", resume.id, v1.label);
//!     Ok(())
//! }
//! ```

pub mod applications;
pub mod documents;
pub mod mirror;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use dossier_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use applications::{ref_column, ref_columns, NewApplication, PgApplicationRepository};
pub use documents::{hash_content, PgDocumentRepository};
pub use mirror::{FilesystemBackend, VersionMirror};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Resume family repository.
    pub resumes: PgDocumentRepository,
    /// Cover-letter family repository.
    pub cover_letters: PgDocumentRepository,
    /// Application repository.
    pub applications: PgApplicationRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            resumes: PgDocumentRepository::new(pool.clone(), DocumentKind::Resume),
            cover_letters: PgDocumentRepository::new(pool.clone(), DocumentKind::CoverLetter),
            applications: PgApplicationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Attach an object-store mirror for version content to both families.
    pub fn with_storage(mut self, backend: impl StorageBackend + 'static) -> Self {
        let mirror = VersionMirror::new(backend);
        self.resumes = self.resumes.with_mirror(mirror.clone());
        self.cover_letters = self.cover_letters.with_mirror(mirror);
        self
    }

    /// Repository for the given document family.
    pub fn documents(&self, kind: DocumentKind) -> &PgDocumentRepository {
        match kind {
            DocumentKind::Resume => &self.resumes,
            DocumentKind::CoverLetter => &self.cover_letters,
        }
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\x"), "50\\%\\_off\\\\x");
    }

    #[test]
    fn test_escape_like_plain_text_untouched() {
        assert_eq!(escape_like("Acme Corp"), "Acme Corp");
    }
}
