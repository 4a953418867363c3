//! Customization engine: generate or reuse company-specific versions.
//!
//! A customized version is keyed by the `" - {company}"` label suffix alone.
//! If any version of the master already carries the suffix it is returned
//! unchanged — no generation call, no new row — so sequential re-customization
//! for the same company is idempotent. The key deliberately ignores the job
//! description: two postings at the same company collapse onto one version.
//!
//! The reuse lookup is read-then-write without a uniqueness constraint, so
//! two concurrent requests for the same master/company can each miss the
//! lookup and insert colliding labels. Sequential callers never observe this.

use tracing::info;
use uuid::Uuid;

use dossier_core::labels;
use dossier_core::{DocumentKind, DocumentVersion, Error, Result};
use dossier_db::Database;
use dossier_inference::DocumentTailor;

/// Outcome of a customization request.
///
/// `Reused` means the dedup key matched and nothing was generated or written.
#[derive(Debug, Clone)]
pub enum CustomizeOutcome {
    Reused(DocumentVersion),
    Generated(DocumentVersion),
}

impl CustomizeOutcome {
    /// The version, however it was obtained.
    pub fn version(&self) -> &DocumentVersion {
        match self {
            Self::Reused(v) | Self::Generated(v) => v,
        }
    }

    /// Consume the outcome, returning the version.
    pub fn into_version(self) -> DocumentVersion {
        match self {
            Self::Reused(v) | Self::Generated(v) => v,
        }
    }

    pub fn was_reused(&self) -> bool {
        matches!(self, Self::Reused(_))
    }
}

/// Service producing customized document versions.
#[derive(Clone)]
pub struct CustomizationService {
    db: Database,
    tailor: DocumentTailor,
}

impl CustomizationService {
    /// Create a new customization service.
    pub fn new(db: Database, tailor: DocumentTailor) -> Self {
        Self { db, tailor }
    }

    /// Produce a company-customized version of a document for an application.
    ///
    /// Verifies that `master_id` belongs to `user_id` and that
    /// `original_version_id` belongs to the master, reuses an existing
    /// company-suffixed version when present, and otherwise generates new
    /// content and appends it as `"v{n+1} - {company}"` with
    /// `is_original = false`.
    pub async fn customize_for_application(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        master_id: Uuid,
        original_version_id: Uuid,
        job_description: &str,
        company: &str,
        instructions: Option<&str>,
    ) -> Result<CustomizeOutcome> {
        if company.trim().is_empty() {
            return Err(Error::Validation("company must not be empty".to_string()));
        }

        let repo = self.db.documents(kind);

        // Ownership and version-parent checks, before anything else.
        let original = repo
            .get_version(user_id, master_id, original_version_id)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) | Error::DocumentNotFound(_) => {
                    Error::Validation(format!("invalid original {} version", kind))
                }
                other => other,
            })?;

        // Reuse lookup: any existing version with the company suffix wins.
        {
            let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
            let existing = repo
                .find_version_by_company_tx(&mut tx, master_id, company)
                .await?;
            if let Some(version) = existing {
                info!(
                    subsystem = "documents",
                    component = "customize",
                    op = "reuse",
                    document_id = %master_id,
                    version_id = %version.id,
                    label = %version.label,
                    "Reusing existing customized version"
                );
                return Ok(CustomizeOutcome::Reused(version));
            }
        }

        // Generation happens outside any transaction: it is the only
        // long-latency step and must not hold row locks.
        let content = match kind {
            DocumentKind::Resume => {
                self.tailor
                    .rewrite_resume(&original.content, job_description, instructions)
                    .await?
            }
            DocumentKind::CoverLetter => {
                self.tailor
                    .rewrite_cover_letter(&original.content, job_description, instructions)
                    .await?
            }
        };

        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let count = repo.count_versions_tx(&mut tx, master_id).await?;
        let label = labels::customized_label(count + 1, company);
        let version = repo
            .insert_version_tx(
                &mut tx,
                master_id,
                &label,
                &content,
                Some(job_description),
                false,
            )
            .await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "documents",
            component = "customize",
            op = "generate",
            document_id = %master_id,
            version_id = %version.id,
            label = %version.label,
            model = %self.tailor.model_name(),
            "Created customized version"
        );

        Ok(CustomizeOutcome::Generated(version))
    }
}
