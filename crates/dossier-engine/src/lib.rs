//! # dossier-engine
//!
//! Service layer for dossier: application lifecycle, document customization,
//! dependency resolution, and cascade deletion.
//!
//! The engine composes the repositories from `dossier-db` with a
//! [`dossier_inference::DocumentTailor`]; every mutating operation runs in a
//! single transaction with its dependency checks, and dry runs compute the
//! same plan a real deletion would execute.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dossier_db::Database;
//! use dossier_engine::{ApplicationService, CascadeService};
//! use dossier_inference::{DocumentTailor, OpenAiBackend};
//!
//! let db = Database::connect("postgres://localhost/dossier").await?;
//! let tailor = DocumentTailor::new(Arc::new(OpenAiBackend::from_env()?));
//! let applications = ApplicationService::new(db.clone(), tailor);
//! let cascade = CascadeService::new(db);
//! ```

pub mod applications;
pub mod cascade;
pub mod customize;
pub mod dependency;

pub use applications::ApplicationService;
pub use cascade::{
    ApplicationDeletionResult, BulkDeletionSummary, BulkItemOutcome, CascadeService,
    DeletionPreview, MasterDeletionResult, PreviewItem, PreviewItemKind,
};
pub use customize::{CustomizationService, CustomizeOutcome};
pub use dependency::{
    BlockingApplication, DependencyResolver, MasterDependencyReport, VersionDependencyReport,
};
