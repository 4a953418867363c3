//! Cascade-deletion engine.
//!
//! Orchestrates deletion of applications, single versions, and whole master
//! documents. Every mutating operation runs inside one transaction; the
//! dependency checks read (and lock) rows in that same transaction, so no
//! reference can appear between the check and the delete. Dry runs compute
//! the identical plan and roll the transaction back.
//!
//! Protected references are never touched here: deleting an application
//! removes its own row plus its owned-for-cascade versions, and only when no
//! other application shares them.

use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use dossier_core::{Application, DocumentKind, DocumentVersion, Error, Result};
use dossier_db::Database;

use crate::dependency::DependencyResolver;

/// Result of deleting (or dry-running the deletion of) an application.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApplicationDeletionResult {
    pub success: bool,
    pub application_deleted: bool,
    pub customized_resume_version_deleted: bool,
    pub customized_cover_letter_version_deleted: bool,
    /// The owned resume version this operation deletes (or would delete).
    pub customized_resume_version_id: Option<Uuid>,
    /// The owned cover-letter version this operation deletes (or would delete).
    pub customized_cover_letter_version_id: Option<Uuid>,
    pub message: String,
    pub warnings: Vec<String>,
}

/// Result of deleting a master document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MasterDeletionResult {
    pub deleted: bool,
    /// Blocking applications removed by a forced deletion.
    pub applications_deleted: usize,
    /// Every version row removed: the master's own cascade plus the
    /// owned-for-cascade versions of the deleted applications.
    pub versions_deleted: usize,
    pub message: String,
}

/// Per-item outcome inside a bulk deletion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BulkItemOutcome {
    pub application_id: Uuid,
    pub success: bool,
    pub message: String,
    pub detail: Option<ApplicationDeletionResult>,
}

/// Aggregated result of a bulk application deletion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BulkDeletionSummary {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
    pub customized_versions_deleted: usize,
    pub results: Vec<BulkItemOutcome>,
    pub errors: Vec<String>,
}

/// What a preview entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewItemKind {
    ResumeVersion,
    CoverLetterVersion,
    CustomizedResumeVersion,
    CustomizedCoverLetterVersion,
    CoverLetterMaster,
}

/// One entry of a deletion preview.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PreviewItem {
    pub kind: PreviewItemKind,
    pub id: Uuid,
    /// Version label, or master title for `CoverLetterMaster`.
    pub label: String,
    pub reason: Option<String>,
}

/// Read-only plan of an application deletion, for UI consumption.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeletionPreview {
    pub application_id: Uuid,
    pub company: String,
    pub position: String,
    pub applied_date: chrono::NaiveDate,
    pub will_delete: Vec<PreviewItem>,
    pub will_preserve: Vec<PreviewItem>,
    pub warnings: Vec<String>,
}

/// Owned-version plan computed inside the deletion transaction.
#[derive(Debug, Default)]
struct CascadePlan {
    resume_version: Option<DocumentVersion>,
    cover_letter_version: Option<DocumentVersion>,
    /// Owned versions left in place because other applications share them.
    shared: Vec<(DocumentKind, DocumentVersion, i64)>,
    warnings: Vec<String>,
}

impl CascadePlan {
    fn deletions(&self) -> usize {
        self.resume_version.is_some() as usize + self.cover_letter_version.is_some() as usize
    }
}

/// Service orchestrating cascade deletions.
#[derive(Clone)]
pub struct CascadeService {
    db: Database,
    resolver: DependencyResolver,
}

impl CascadeService {
    /// Create a new cascade service.
    pub fn new(db: Database) -> Self {
        let resolver = DependencyResolver::new(db.clone());
        Self { db, resolver }
    }

    /// The resolver used for pre-deletion checks.
    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Compute which owned versions of `app` are eligible for cascade.
    ///
    /// A customized version is eligible only when no other application
    /// references it by any column; otherwise it is recorded as shared with
    /// a warning. With `lock`, eligible/shared version rows are locked for
    /// the remainder of the transaction.
    async fn plan_cascade_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        app: &Application,
        lock: bool,
    ) -> Result<CascadePlan> {
        let mut plan = CascadePlan::default();

        let owned_refs = [
            (DocumentKind::Resume, app.customized_resume_version_id),
            (
                DocumentKind::CoverLetter,
                app.customized_cover_letter_version_id,
            ),
        ];

        for (kind, owned) in owned_refs {
            let Some(version_id) = owned else { continue };
            let repo = self.db.documents(kind);

            let version = if lock {
                repo.get_version_for_update_tx(tx, version_id).await?
            } else {
                repo.get_version_by_id_tx(tx, version_id).await?
            };
            let Some(version) = version else {
                // Dangling owned reference; nothing to cascade.
                continue;
            };

            let others = self
                .db
                .applications
                .count_other_references_tx(tx, kind, version_id, Some(app.id))
                .await?;

            if others > 0 {
                plan.warnings.push(format!(
                    "Customized {} version '{}' is used by {} other application(s) and will be preserved.",
                    kind, version.label, others
                ));
                plan.shared.push((kind, version, others));
            } else {
                match kind {
                    DocumentKind::Resume => plan.resume_version = Some(version),
                    DocumentKind::CoverLetter => plan.cover_letter_version = Some(version),
                }
            }
        }

        Ok(plan)
    }

    /// Delete the owned versions in `plan`, then the application row.
    async fn execute_cascade_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        app: &Application,
        plan: &CascadePlan,
    ) -> Result<(bool, bool)> {
        let mut resume_deleted = false;
        let mut cover_letter_deleted = false;

        if let Some(version) = &plan.resume_version {
            resume_deleted = self.db.resumes.delete_version_tx(tx, version.id).await?;
        }
        if let Some(version) = &plan.cover_letter_version {
            cover_letter_deleted = self
                .db
                .cover_letters
                .delete_version_tx(tx, version.id)
                .await?;
        }

        self.db.applications.delete_tx(tx, app.id).await?;

        Ok((resume_deleted, cover_letter_deleted))
    }

    /// Delete an application, cascading into its owned versions.
    ///
    /// With `dry_run`, computes the identical plan — including the warnings a
    /// real deletion would emit — and commits nothing.
    pub async fn delete_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        dry_run: bool,
    ) -> Result<ApplicationDeletionResult> {
        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let app = self
            .db
            .applications
            .fetch_for_update_tx(&mut tx, user_id, application_id)
            .await?;

        let plan = self.plan_cascade_tx(&mut tx, &app, true).await?;
        let resume_target = plan.resume_version.as_ref().map(|v| v.id);
        let cover_letter_target = plan.cover_letter_version.as_ref().map(|v| v.id);

        if dry_run {
            tx.rollback().await.map_err(Error::Database)?;

            let mut message = "Dry run completed. No data was deleted.".to_string();
            if let Some(id) = resume_target {
                message.push_str(&format!(" Would delete customized resume version {}.", id));
            }
            if let Some(id) = cover_letter_target {
                message.push_str(&format!(
                    " Would delete customized cover letter version {}.",
                    id
                ));
            }

            return Ok(ApplicationDeletionResult {
                success: true,
                application_deleted: false,
                customized_resume_version_deleted: false,
                customized_cover_letter_version_deleted: false,
                customized_resume_version_id: resume_target,
                customized_cover_letter_version_id: cover_letter_target,
                message,
                warnings: plan.warnings,
            });
        }

        let (resume_deleted, cover_letter_deleted) =
            self.execute_cascade_tx(&mut tx, &app, &plan).await?;
        tx.commit().await.map_err(Error::Database)?;

        let mut message = format!(
            "Application for {} - {} deleted successfully.",
            app.company, app.position
        );
        if resume_deleted {
            message.push_str(" Customized resume version was also deleted.");
        }
        if cover_letter_deleted {
            message.push_str(" Customized cover letter version was also deleted.");
        }

        info!(
            subsystem = "applications",
            component = "cascade",
            op = "delete_application",
            application_id = %application_id,
            user_id = %user_id,
            customized_resume_deleted = resume_deleted,
            customized_cover_letter_deleted = cover_letter_deleted,
            "Deleted application"
        );

        Ok(ApplicationDeletionResult {
            success: true,
            application_deleted: true,
            customized_resume_version_deleted: resume_deleted,
            customized_cover_letter_version_deleted: cover_letter_deleted,
            customized_resume_version_id: resume_target,
            customized_cover_letter_version_id: cover_letter_target,
            message,
            warnings: plan.warnings,
        })
    }

    /// Delete a master document and all of its versions.
    ///
    /// Without `force`, any blocking application fails the call with a
    /// `Conflict` carrying the blocking count and ids. With `force`, every
    /// blocking application is deleted first (cascading its owned versions
    /// per the single-reference rule), then the master — all inside one
    /// transaction, so a failure on any item commits nothing.
    pub async fn delete_master(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        master_id: Uuid,
        force: bool,
    ) -> Result<MasterDeletionResult> {
        let repo = self.db.documents(kind);

        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let master = repo.get_for_update_tx(&mut tx, user_id, master_id).await?;

        let report = self
            .resolver
            .check_master_dependencies_tx(&mut tx, kind, master_id)
            .await?;

        if !report.can_delete && !force {
            let blocking_ids = report.blocking_ids();
            return Err(Error::conflict(report.message, blocking_ids));
        }

        let mut applications_deleted = 0usize;
        let mut versions_deleted = 0usize;

        if force && !report.can_delete {
            let blocking = self
                .db
                .applications
                .blocking_master_tx(&mut tx, kind, master_id)
                .await?;
            for app in &blocking {
                let plan = self.plan_cascade_tx(&mut tx, app, true).await?;
                versions_deleted += plan.deletions();
                self.execute_cascade_tx(&mut tx, app, &plan).await?;
                applications_deleted += 1;
            }
        }

        // Whatever versions remain cascade with the master row.
        versions_deleted += repo.count_versions_tx(&mut tx, master_id).await? as usize;
        repo.delete_master_tx(&mut tx, master_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "documents",
            component = "cascade",
            op = "delete_master",
            document_id = %master_id,
            user_id = %user_id,
            kind = %kind,
            applications_deleted,
            versions_deleted,
            "Deleted master document"
        );

        Ok(MasterDeletionResult {
            deleted: true,
            applications_deleted,
            versions_deleted,
            message: format!(
                "Deleted {} '{}' with {} version(s) and {} application(s)",
                kind, master.title, versions_deleted, applications_deleted
            ),
        })
    }

    /// Delete a single version after a dependency check.
    ///
    /// Fails with `Conflict` when the version is the master's last, when it
    /// is a referenced original, or when any application references it.
    pub async fn delete_version(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        master_id: Uuid,
        version_id: Uuid,
    ) -> Result<bool> {
        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;

        let (version, report) = self
            .resolver
            .check_version_for_delete_tx(&mut tx, user_id, kind, master_id, version_id)
            .await?;

        if !report.can_delete {
            let referencing_ids = report.referencing_ids();
            return Err(Error::conflict(report.message, referencing_ids));
        }

        let deleted = self
            .db
            .documents(kind)
            .delete_version_tx(&mut tx, version.id)
            .await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "documents",
            component = "cascade",
            op = "delete_version",
            document_id = %master_id,
            version_id = %version_id,
            kind = %kind,
            "Deleted document version"
        );

        Ok(deleted)
    }

    /// Delete several applications, best-effort.
    ///
    /// Items are independent: each runs in its own transaction, and one
    /// failure neither aborts nor masks the others.
    pub async fn bulk_delete_applications(
        &self,
        user_id: Uuid,
        application_ids: &[Uuid],
        dry_run: bool,
    ) -> BulkDeletionSummary {
        let mut summary = BulkDeletionSummary {
            total: application_ids.len(),
            deleted: 0,
            failed: 0,
            customized_versions_deleted: 0,
            results: Vec::with_capacity(application_ids.len()),
            errors: Vec::new(),
        };

        for &application_id in application_ids {
            match self.delete_application(user_id, application_id, dry_run).await {
                Ok(result) => {
                    summary.deleted += 1;
                    summary.customized_versions_deleted +=
                        result.customized_resume_version_deleted as usize
                            + result.customized_cover_letter_version_deleted as usize;
                    summary.results.push(BulkItemOutcome {
                        application_id,
                        success: true,
                        message: result.message.clone(),
                        detail: Some(result),
                    });
                }
                Err(e) => {
                    warn!(
                        subsystem = "applications",
                        component = "cascade",
                        op = "bulk_delete",
                        application_id = %application_id,
                        error = %e,
                        "Bulk deletion item failed"
                    );
                    summary.failed += 1;
                    summary
                        .errors
                        .push(format!("Application {}: {}", application_id, e));
                    summary.results.push(BulkItemOutcome {
                        application_id,
                        success: false,
                        message: e.to_string(),
                        detail: None,
                    });
                }
            }
        }

        summary
    }

    /// Read-only preview of an application deletion.
    ///
    /// Side-effect-free; matches what [`Self::delete_application`] would do
    /// absent concurrent writes.
    pub async fn deletion_preview(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<DeletionPreview> {
        let app = self.db.applications.fetch(user_id, application_id).await?;

        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let plan = self.plan_cascade_tx(&mut tx, &app, false).await?;

        let mut will_delete = Vec::new();
        if let Some(version) = &plan.resume_version {
            will_delete.push(PreviewItem {
                kind: PreviewItemKind::CustomizedResumeVersion,
                id: version.id,
                label: version.label.clone(),
                reason: None,
            });
        }
        if let Some(version) = &plan.cover_letter_version {
            will_delete.push(PreviewItem {
                kind: PreviewItemKind::CustomizedCoverLetterVersion,
                id: version.id,
                label: version.label.clone(),
                reason: None,
            });
        }

        let mut will_preserve = Vec::new();

        // The protected original resume version is always preserved.
        if let Some(version) = self
            .db
            .resumes
            .get_version_by_id_tx(&mut tx, app.resume_version_id)
            .await?
        {
            will_preserve.push(PreviewItem {
                kind: PreviewItemKind::ResumeVersion,
                id: version.id,
                label: version.label,
                reason: Some("original version is protected".to_string()),
            });
        }

        if let Some(version_id) = app.cover_letter_version_id {
            if let Some(version) = self
                .db
                .cover_letters
                .get_version_by_id_tx(&mut tx, version_id)
                .await?
            {
                will_preserve.push(PreviewItem {
                    kind: PreviewItemKind::CoverLetterVersion,
                    id: version.id,
                    label: version.label,
                    reason: Some("original version is protected".to_string()),
                });
            }
        }

        for (kind, version, others) in &plan.shared {
            will_preserve.push(PreviewItem {
                kind: match kind {
                    DocumentKind::Resume => PreviewItemKind::CustomizedResumeVersion,
                    DocumentKind::CoverLetter => PreviewItemKind::CustomizedCoverLetterVersion,
                },
                id: version.id,
                label: version.label.clone(),
                reason: Some(format!("used by {} other application(s)", others)),
            });
        }

        tx.rollback().await.map_err(Error::Database)?;

        if let Some(cover_letter_id) = app.cover_letter_id {
            let master = self.db.cover_letters.get(user_id, cover_letter_id).await?;
            will_preserve.push(PreviewItem {
                kind: PreviewItemKind::CoverLetterMaster,
                id: master.id,
                label: master.title,
                reason: Some("master documents are never deleted with applications".to_string()),
            });
        }

        Ok(DeletionPreview {
            application_id: app.id,
            company: app.company,
            position: app.position,
            applied_date: app.applied_date,
            will_delete,
            will_preserve,
            warnings: plan.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn version(label: &str) -> DocumentVersion {
        DocumentVersion {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            label: label.to_string(),
            content: "x".to_string(),
            content_hash: "sha256:0".to_string(),
            job_description: None,
            is_original: false,
            created_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_plan_deletion_count() {
        let mut plan = CascadePlan::default();
        assert_eq!(plan.deletions(), 0);
        plan.resume_version = Some(version("v2 - Acme"));
        assert_eq!(plan.deletions(), 1);
        plan.cover_letter_version = Some(version("v3 - Acme"));
        assert_eq!(plan.deletions(), 2);
    }

    #[test]
    fn test_preview_item_kind_serializes_snake_case() {
        let json = serde_json::to_string(&PreviewItemKind::CustomizedResumeVersion).unwrap();
        assert_eq!(json, "\"customized_resume_version\"");
    }
}
