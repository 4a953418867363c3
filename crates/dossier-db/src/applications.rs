//! Application (link record) repository.
//!
//! Applications tie a resume version — and optionally a cover-letter version
//! pair — to a company/position. This module owns row access only; the
//! reference-counting and cascade decisions live in the engine crate, which
//! calls the `_tx` variants here so checks and mutations share one
//! transaction.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use dossier_core::defaults;
use dossier_core::{
    new_v7, Application, ApplicationStats, ApplicationStatus, DocumentKind, Error,
    ListApplicationsRequest, ListApplicationsResponse, ReferenceKind, Result,
    UpdateApplicationRequest,
};

use crate::escape_like;

/// Resolved reference set for inserting an application row.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub resume_version_id: Uuid,
    pub customized_resume_version_id: Option<Uuid>,
    pub cover_letter_id: Option<Uuid>,
    pub cover_letter_version_id: Option<Uuid>,
    pub customized_cover_letter_version_id: Option<Uuid>,
    pub company: String,
    pub position: String,
    pub job_description: Option<String>,
    pub additional_instructions: Option<String>,
    pub status: ApplicationStatus,
    pub applied_date: NaiveDate,
    pub notes: Option<String>,
}

/// Column holding a reference of the given kind into one document family.
///
/// Returns `None` for combinations the schema does not have (only cover
/// letters carry a nullable master reference).
pub fn ref_column(kind: DocumentKind, reference: ReferenceKind) -> Option<&'static str> {
    match (kind, reference) {
        (DocumentKind::Resume, ReferenceKind::Protected) => Some("resume_version_id"),
        (DocumentKind::Resume, ReferenceKind::OwnedForCascade) => {
            Some("customized_resume_version_id")
        }
        (DocumentKind::Resume, ReferenceKind::NullableOnDelete) => None,
        (DocumentKind::CoverLetter, ReferenceKind::Protected) => Some("cover_letter_version_id"),
        (DocumentKind::CoverLetter, ReferenceKind::OwnedForCascade) => {
            Some("customized_cover_letter_version_id")
        }
        (DocumentKind::CoverLetter, ReferenceKind::NullableOnDelete) => Some("cover_letter_id"),
    }
}

/// The version-reference columns of one document family:
/// `(protected, owned_for_cascade)`.
pub fn ref_columns(kind: DocumentKind) -> (&'static str, &'static str) {
    match kind {
        DocumentKind::Resume => ("resume_version_id", "customized_resume_version_id"),
        DocumentKind::CoverLetter => (
            "cover_letter_version_id",
            "customized_cover_letter_version_id",
        ),
    }
}

/// PostgreSQL repository for application rows.
#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an application row inside an open transaction.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new: NewApplication,
    ) -> Result<Application> {
        sqlx::query_as(
            r#"
            INSERT INTO application (
                id, user_id, resume_version_id, customized_resume_version_id,
                cover_letter_id, cover_letter_version_id,
                customized_cover_letter_version_id, company, position,
                job_description, additional_instructions, status, applied_date,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(new_v7())
        .bind(new.user_id)
        .bind(new.resume_version_id)
        .bind(new.customized_resume_version_id)
        .bind(new.cover_letter_id)
        .bind(new.cover_letter_version_id)
        .bind(new.customized_cover_letter_version_id)
        .bind(&new.company)
        .bind(&new.position)
        .bind(new.job_description)
        .bind(new.additional_instructions)
        .bind(new.status)
        .bind(new.applied_date)
        .bind(new.notes)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Fetch an application, verifying ownership.
    pub async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Application> {
        sqlx::query_as("SELECT * FROM application WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::ApplicationNotFound(id))
    }

    /// Fetch an application inside an open transaction, locking the row.
    pub async fn fetch_for_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Application> {
        sqlx::query_as("SELECT * FROM application WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::ApplicationNotFound(id))
    }

    /// List a user's applications with optional filters and pagination,
    /// most recent applied date first.
    pub async fn list(
        &self,
        user_id: Uuid,
        req: ListApplicationsRequest,
    ) -> Result<ListApplicationsResponse> {
        let company_pattern = req
            .company
            .as_deref()
            .map(|c| format!("%{}%", escape_like(c)));
        let limit = req.limit.unwrap_or(defaults::PAGE_LIMIT);
        let offset = req.offset.unwrap_or(defaults::PAGE_OFFSET);

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM application
            WHERE user_id = $1
              AND ($2::application_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR company ILIKE $3 ESCAPE '\')
            "#,
        )
        .bind(user_id)
        .bind(req.status)
        .bind(&company_pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let applications: Vec<Application> = sqlx::query_as(
            r#"
            SELECT * FROM application
            WHERE user_id = $1
              AND ($2::application_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR company ILIKE $3 ESCAPE '\')
            ORDER BY applied_date DESC, created_at_utc DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(req.status)
        .bind(&company_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ListApplicationsResponse {
            applications,
            total,
        })
    }

    /// Search applications by company, position, job description, or notes.
    pub async fn search(
        &self,
        user_id: Uuid,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<ListApplicationsResponse> {
        let pattern = format!("%{}%", escape_like(query));

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM application
            WHERE user_id = $1
              AND (company ILIKE $2 ESCAPE '\'
                   OR position ILIKE $2 ESCAPE '\'
                   OR COALESCE(job_description, '') ILIKE $2 ESCAPE '\'
                   OR COALESCE(notes, '') ILIKE $2 ESCAPE '\')
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let applications: Vec<Application> = sqlx::query_as(
            r#"
            SELECT * FROM application
            WHERE user_id = $1
              AND (company ILIKE $2 ESCAPE '\'
                   OR position ILIKE $2 ESCAPE '\'
                   OR COALESCE(job_description, '') ILIKE $2 ESCAPE '\'
                   OR COALESCE(notes, '') ILIKE $2 ESCAPE '\')
            ORDER BY applied_date DESC, created_at_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ListApplicationsResponse {
            applications,
            total,
        })
    }

    /// Patch application fields. `None` fields are untouched.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: UpdateApplicationRequest,
    ) -> Result<Application> {
        sqlx::query_as(
            r#"
            UPDATE application
            SET company = COALESCE($3, company),
                position = COALESCE($4, position),
                job_description = COALESCE($5, job_description),
                status = COALESCE($6, status),
                applied_date = COALESCE($7, applied_date),
                notes = COALESCE($8, notes),
                additional_instructions = COALESCE($9, additional_instructions),
                updated_at_utc = $10
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(req.company)
        .bind(req.position)
        .bind(req.job_description)
        .bind(req.status)
        .bind(req.applied_date)
        .bind(req.notes)
        .bind(req.additional_instructions)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ApplicationNotFound(id))
    }

    /// Update an application's cover-letter references.
    pub async fn set_cover_letter_refs(
        &self,
        user_id: Uuid,
        id: Uuid,
        cover_letter_id: Option<Uuid>,
        cover_letter_version_id: Option<Uuid>,
        customized_cover_letter_version_id: Option<Uuid>,
    ) -> Result<Application> {
        sqlx::query_as(
            r#"
            UPDATE application
            SET cover_letter_id = $3,
                cover_letter_version_id = $4,
                customized_cover_letter_version_id = $5,
                updated_at_utc = $6
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(cover_letter_id)
        .bind(cover_letter_version_id)
        .bind(customized_cover_letter_version_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ApplicationNotFound(id))
    }

    /// Delete an application row inside an open transaction.
    pub async fn delete_tx(&self, tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM application WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-status counts plus a trailing-window activity count.
    pub async fn stats(&self, user_id: Uuid, today: NaiveDate) -> Result<ApplicationStats> {
        let rows: Vec<(ApplicationStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM application WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut stats = ApplicationStats {
            total: 0,
            applied: 0,
            interviewing: 0,
            rejected: 0,
            offers: 0,
            withdrawn: 0,
            recent_month: 0,
        };
        for (status, count) in rows {
            stats.total += count;
            match status {
                ApplicationStatus::Applied => stats.applied = count,
                ApplicationStatus::Interviewing => stats.interviewing = count,
                ApplicationStatus::Rejected => stats.rejected = count,
                ApplicationStatus::Offer => stats.offers = count,
                ApplicationStatus::Withdrawn => stats.withdrawn = count,
            }
        }

        let window_start = today - Duration::days(defaults::RECENT_WINDOW_DAYS);
        let (recent,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM application WHERE user_id = $1 AND applied_date >= $2",
        )
        .bind(user_id)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        stats.recent_month = recent;

        Ok(stats)
    }

    // =========================================================================
    // REFERENCE QUERIES (dependency resolution)
    // =========================================================================

    /// Count applications other than `exclude` referencing a version by
    /// either the protected or the owned reference of its family.
    ///
    /// A customized version becomes effectively shared once another
    /// application points at it, by whichever column.
    pub async fn count_other_references_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: DocumentKind,
        version_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<i64> {
        let (protected, owned) = ref_columns(kind);
        let (count,): (i64,) = sqlx::query_as(&format!(
            r#"
            SELECT COUNT(*) FROM application
            WHERE ({protected} = $1 OR {owned} = $1)
              AND ($2::uuid IS NULL OR id <> $2)
            "#,
        ))
        .bind(version_id)
        .bind(exclude)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }

    /// Applications referencing a version by any reference of its family,
    /// optionally excluding one application.
    pub async fn referencing_version_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: DocumentKind,
        version_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Application>> {
        let (protected, owned) = ref_columns(kind);
        sqlx::query_as(&format!(
            r#"
            SELECT * FROM application
            WHERE ({protected} = $1 OR {owned} = $1)
              AND ($2::uuid IS NULL OR id <> $2)
            ORDER BY id
            "#,
        ))
        .bind(version_id)
        .bind(exclude)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Applications holding a protected reference to a version.
    pub async fn protected_referencing_version_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: DocumentKind,
        version_id: Uuid,
    ) -> Result<Vec<Application>> {
        let (protected, _) = ref_columns(kind);
        sqlx::query_as(&format!(
            "SELECT * FROM application WHERE {protected} = $1 ORDER BY id",
        ))
        .bind(version_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Applications blocking deletion of a master document.
    ///
    /// Blocking means a protected reference to any of the master's versions;
    /// for cover letters, a direct master reference also blocks.
    pub async fn blocking_master_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: DocumentKind,
        master_id: Uuid,
    ) -> Result<Vec<Application>> {
        let (protected, _) = ref_columns(kind);
        let version_table = kind.version_table();
        let sql = match ref_column(kind, ReferenceKind::NullableOnDelete) {
            Some(master_ref) => format!(
                r#"
                SELECT a.* FROM application a
                WHERE a.{protected} IN
                    (SELECT id FROM {version_table} WHERE document_id = $1)
                   OR a.{master_ref} = $1
                ORDER BY a.id
                "#,
            ),
            None => format!(
                r#"
                SELECT a.* FROM application a
                WHERE a.{protected} IN
                    (SELECT id FROM {version_table} WHERE document_id = $1)
                ORDER BY a.id
                "#,
            ),
        };
        sqlx::query_as(&sql)
            .bind(master_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)
    }
}
