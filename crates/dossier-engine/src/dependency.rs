//! Dependency resolution for deletion checks.
//!
//! Given a master document or a single version, computes the set of
//! applications referencing it and whether the deletion may proceed. The
//! standalone entry points are pure reads; the `_tx` variants run inside the
//! deletion transaction and lock the rows they inspect, so the check and the
//! subsequent delete act on the same state.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use dossier_core::{
    Application, ApplicationStatus, DocumentKind, DocumentVersion, Error, Result,
};
use dossier_db::Database;

/// Summary of an application blocking (or referencing) a deletion target.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockingApplication {
    pub id: Uuid,
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
}

impl From<&Application> for BlockingApplication {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            company: app.company.clone(),
            position: app.position.clone(),
            status: app.status,
        }
    }
}

/// Result of a master-level dependency check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MasterDependencyReport {
    pub can_delete: bool,
    pub blocking_applications: Vec<BlockingApplication>,
    pub message: String,
}

impl MasterDependencyReport {
    /// Ids of the blocking applications.
    pub fn blocking_ids(&self) -> Vec<Uuid> {
        self.blocking_applications.iter().map(|a| a.id).collect()
    }
}

/// Result of a version-level dependency check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionDependencyReport {
    pub can_delete: bool,
    pub is_original: bool,
    pub is_last_version: bool,
    pub referencing_applications: Vec<BlockingApplication>,
    pub message: String,
}

impl VersionDependencyReport {
    pub fn referencing_ids(&self) -> Vec<Uuid> {
        self.referencing_applications.iter().map(|a| a.id).collect()
    }
}

/// Resolver for reference graphs over masters, versions, and applications.
#[derive(Clone)]
pub struct DependencyResolver {
    db: Database,
}

impl DependencyResolver {
    /// Create a new resolver.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Check whether a master document can be deleted.
    ///
    /// Blocking applications are those holding a protected reference to any
    /// of the master's versions; for cover letters, a direct master
    /// reference also blocks.
    pub async fn check_master_dependencies(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        master_id: Uuid,
    ) -> Result<MasterDependencyReport> {
        self.db.documents(kind).get(user_id, master_id).await?;

        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let blocking = self
            .db
            .applications
            .blocking_master_tx(&mut tx, kind, master_id)
            .await?;
        Ok(Self::master_report(kind, &blocking))
    }

    /// Transactional variant used by the cascade engine; assumes the master
    /// row is already fetched/locked by the caller.
    pub(crate) async fn check_master_dependencies_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: DocumentKind,
        master_id: Uuid,
    ) -> Result<MasterDependencyReport> {
        let blocking = self
            .db
            .applications
            .blocking_master_tx(tx, kind, master_id)
            .await?;
        Ok(Self::master_report(kind, &blocking))
    }

    fn master_report(kind: DocumentKind, blocking: &[Application]) -> MasterDependencyReport {
        let blocking_applications: Vec<BlockingApplication> =
            blocking.iter().map(Into::into).collect();
        let can_delete = blocking_applications.is_empty();
        let message = if can_delete {
            format!("No applications reference this {}", kind)
        } else {
            format!(
                "{} application(s) reference this {}. Delete the applications or reassign them first.",
                blocking_applications.len(),
                kind
            )
        };
        MasterDependencyReport {
            can_delete,
            blocking_applications,
            message,
        }
    }

    /// Check whether a single version can be deleted.
    ///
    /// Deletion is refused when the version is the master's only one, when it
    /// is the original and a protected reference points at it, or when any
    /// application references it at all.
    pub async fn check_version_dependencies(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        master_id: Uuid,
        version_id: Uuid,
    ) -> Result<VersionDependencyReport> {
        let repo = self.db.documents(kind);
        let version = repo.get_version(user_id, master_id, version_id).await?;

        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let count = repo.count_versions_tx(&mut tx, master_id).await?;
        let referencing = self
            .db
            .applications
            .referencing_version_tx(&mut tx, kind, version_id, None)
            .await?;
        Ok(Self::version_report(kind, &version, count, &referencing))
    }

    /// Transactional variant used by the cascade engine. Locks the master and
    /// version rows, and returns the locked version alongside the report.
    pub(crate) async fn check_version_for_delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        kind: DocumentKind,
        master_id: Uuid,
        version_id: Uuid,
    ) -> Result<(DocumentVersion, VersionDependencyReport)> {
        let repo = self.db.documents(kind);
        repo.get_for_update_tx(tx, user_id, master_id).await?;

        let version = repo
            .get_version_for_update_tx(tx, version_id)
            .await?
            .filter(|v| v.document_id == master_id)
            .ok_or_else(|| Error::NotFound(format!("version {} not found", version_id)))?;

        let count = repo.count_versions_tx(tx, master_id).await?;
        let referencing = self
            .db
            .applications
            .referencing_version_tx(tx, kind, version_id, None)
            .await?;
        let report = Self::version_report(kind, &version, count, &referencing);
        Ok((version, report))
    }

    fn version_report(
        kind: DocumentKind,
        version: &DocumentVersion,
        version_count: i64,
        referencing: &[Application],
    ) -> VersionDependencyReport {
        let referencing_applications: Vec<BlockingApplication> =
            referencing.iter().map(Into::into).collect();
        let is_last_version = version_count <= 1;

        let (can_delete, message) = if is_last_version {
            (
                false,
                format!("Cannot delete the only version of a {}", kind),
            )
        } else if version.is_original && !referencing_applications.is_empty() {
            (
                false,
                format!(
                    "Version '{}' is the original and is referenced by {} application(s)",
                    version.label,
                    referencing_applications.len()
                ),
            )
        } else if !referencing_applications.is_empty() {
            (
                false,
                format!(
                    "Version '{}' is referenced by {} application(s)",
                    version.label,
                    referencing_applications.len()
                ),
            )
        } else {
            (true, format!("Version '{}' can be deleted", version.label))
        };

        VersionDependencyReport {
            can_delete,
            is_original: version.is_original,
            is_last_version,
            referencing_applications,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn version(label: &str, is_original: bool) -> DocumentVersion {
        DocumentVersion {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            label: label.to_string(),
            content: "x".to_string(),
            content_hash: "sha256:0".to_string(),
            job_description: None,
            is_original,
            created_at_utc: Utc::now(),
        }
    }

    fn app() -> Application {
        Application {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            resume_version_id: Uuid::new_v4(),
            customized_resume_version_id: None,
            cover_letter_id: None,
            cover_letter_version_id: None,
            customized_cover_letter_version_id: None,
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            job_description: None,
            additional_instructions: None,
            status: ApplicationStatus::Applied,
            applied_date: Utc::now().date_naive(),
            notes: None,
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_last_version_blocks_regardless_of_references() {
        let report =
            DependencyResolver::version_report(DocumentKind::Resume, &version("v1", true), 1, &[]);
        assert!(!report.can_delete);
        assert!(report.is_last_version);
        assert!(report.message.contains("only version"));
    }

    #[test]
    fn test_referenced_original_blocks() {
        let apps = [app()];
        let report =
            DependencyResolver::version_report(DocumentKind::Resume, &version("v1", true), 3, &apps);
        assert!(!report.can_delete);
        assert!(report.is_original);
        assert!(report.message.contains("original"));
        assert_eq!(report.referencing_ids(), vec![apps[0].id]);
    }

    #[test]
    fn test_referenced_derived_version_blocks_with_plain_message() {
        let apps = [app()];
        let report = DependencyResolver::version_report(
            DocumentKind::Resume,
            &version("v2 - Acme", false),
            3,
            &apps,
        );
        assert!(!report.can_delete);
        assert!(!report.message.contains("original"));
    }

    #[test]
    fn test_unreferenced_non_last_version_is_deletable() {
        let report = DependencyResolver::version_report(
            DocumentKind::CoverLetter,
            &version("v2", false),
            2,
            &[],
        );
        assert!(report.can_delete);
        assert!(report.message.contains("can be deleted"));
    }

    #[test]
    fn test_master_report_counts_blockers() {
        let apps = [app(), app()];
        let report = DependencyResolver::master_report(DocumentKind::Resume, &apps);
        assert!(!report.can_delete);
        assert_eq!(report.blocking_ids().len(), 2);
        assert!(report.message.contains("2 application(s)"));
        assert!(report.message.contains("resume"));
    }

    #[test]
    fn test_master_report_empty_is_deletable() {
        let report = DependencyResolver::master_report(DocumentKind::CoverLetter, &[]);
        assert!(report.can_delete);
        assert!(report.message.contains("No applications"));
    }
}
