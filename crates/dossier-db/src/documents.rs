//! Master-document and version repository.
//!
//! One implementation serves both document families; [`DocumentKind`] selects
//! the table pair. Masters are created atomically with their `"v1"` version,
//! so a master never exists without at least one version. All reads and
//! writes are gated on the owning user; misses surface as `NotFound`.

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use dossier_core::labels;
use dossier_core::{
    new_v7, CreateDocumentRequest, DocumentKind, DocumentVersion, Error, MasterDocument, Result,
    UpdateDocumentRequest,
};

use crate::escape_like;
use crate::mirror::VersionMirror;

/// PostgreSQL repository for one document family (resumes or cover letters).
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
    kind: DocumentKind,
    mirror: Option<VersionMirror>,
}

/// Compute the stored SHA-256 hash of version content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

impl PgDocumentRepository {
    /// Create a new repository for the given family.
    pub fn new(pool: PgPool, kind: DocumentKind) -> Self {
        Self {
            pool,
            kind,
            mirror: None,
        }
    }

    /// Attach an object-store mirror for version content.
    pub fn with_mirror(mut self, mirror: VersionMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Which family this repository serves.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    async fn mirror_version(&self, user_id: Uuid, document_id: Uuid, label: &str, content: &str) {
        if let Some(mirror) = &self.mirror {
            mirror
                .save_version(user_id, self.kind, document_id, label, content)
                .await;
        }
    }

    // =========================================================================
    // MASTERS
    // =========================================================================

    /// Atomically create a master document and its `"v1"` original version.
    pub async fn create_with_initial_version(
        &self,
        req: CreateDocumentRequest,
    ) -> Result<(MasterDocument, DocumentVersion)> {
        if req.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if req.content.trim().is_empty() {
            return Err(Error::Validation("content must not be empty".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if req.is_default {
            self.clear_default_tx(&mut tx, req.user_id).await?;
        }

        let master_id = new_v7();
        let master: MasterDocument = sqlx::query_as(&format!(
            r#"
            INSERT INTO {} (id, user_id, title, is_default)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
            self.kind.table()
        ))
        .bind(master_id)
        .bind(req.user_id)
        .bind(&req.title)
        .bind(req.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let version = self
            .insert_version_tx(
                &mut tx,
                master_id,
                labels::INITIAL_LABEL,
                &req.content,
                None,
                true,
            )
            .await?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "documents",
            op = "create",
            user_id = %req.user_id,
            document_id = %master.id,
            kind = %self.kind,
            "Created master document with initial version"
        );

        self.mirror_version(req.user_id, master.id, &version.label, &version.content)
            .await;

        Ok((master, version))
    }

    /// Fetch a master document, verifying ownership.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<MasterDocument> {
        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE id = $1 AND user_id = $2",
            self.kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::DocumentNotFound(id))
    }

    /// Fetch a master inside an open transaction, locking the row.
    pub async fn get_for_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<MasterDocument> {
        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE id = $1 AND user_id = $2 FOR UPDATE",
            self.kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::DocumentNotFound(id))
    }

    /// List all masters for a user, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MasterDocument>> {
        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE user_id = $1 ORDER BY created_at_utc DESC, id DESC",
            self.kind.table()
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Update master metadata (title, default flag).
    ///
    /// Setting `is_default = true` clears the flag on the user's other
    /// masters of the same family.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: UpdateDocumentRequest,
    ) -> Result<MasterDocument> {
        // Ownership check first so a miss is NotFound, not a silent no-op.
        self.get(user_id, id).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if req.is_default == Some(true) {
            self.clear_default_tx(&mut tx, user_id).await?;
        }

        let updated: MasterDocument = sqlx::query_as(&format!(
            r#"
            UPDATE {}
            SET title = COALESCE($3, title),
                is_default = COALESCE($4, is_default),
                updated_at_utc = $5
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
            self.kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.title)
        .bind(req.is_default)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(updated)
    }

    async fn clear_default_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<()> {
        sqlx::query(&format!(
            "UPDATE {} SET is_default = FALSE WHERE user_id = $1 AND is_default = TRUE",
            self.kind.table()
        ))
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete a master row inside an open transaction.
    ///
    /// Versions cascade at the database level; callers must have already
    /// resolved blocking references.
    pub async fn delete_master_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.kind.table()))
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    // =========================================================================
    // VERSIONS
    // =========================================================================

    /// Count versions of a master inside an open transaction.
    pub async fn count_versions_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        master_id: Uuid,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE document_id = $1",
            self.kind.version_table()
        ))
        .bind(master_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }

    /// Insert a version row inside an open transaction.
    pub async fn insert_version_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        master_id: Uuid,
        label: &str,
        content: &str,
        job_description: Option<&str>,
        is_original: bool,
    ) -> Result<DocumentVersion> {
        sqlx::query_as(&format!(
            r#"
            INSERT INTO {} (id, document_id, label, content, content_hash,
                            job_description, is_original)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
            self.kind.version_table()
        ))
        .bind(new_v7())
        .bind(master_id)
        .bind(label)
        .bind(content)
        .bind(hash_content(content))
        .bind(job_description)
        .bind(is_original)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Append a version with the next plain `"v{n+1}"` label.
    pub async fn append_version(
        &self,
        user_id: Uuid,
        master_id: Uuid,
        content: &str,
        job_description: Option<&str>,
        is_original: bool,
    ) -> Result<DocumentVersion> {
        if content.trim().is_empty() {
            return Err(Error::Validation("content must not be empty".to_string()));
        }
        self.get(user_id, master_id).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let count = self.count_versions_tx(&mut tx, master_id).await?;
        let label = labels::version_label(count + 1);
        let version = self
            .insert_version_tx(
                &mut tx,
                master_id,
                &label,
                content,
                job_description,
                is_original,
            )
            .await?;
        tx.commit().await.map_err(Error::Database)?;

        self.mirror_version(user_id, master_id, &version.label, &version.content)
            .await;

        Ok(version)
    }

    /// List a master's versions, newest first.
    pub async fn list_versions(&self, user_id: Uuid, master_id: Uuid) -> Result<Vec<DocumentVersion>> {
        self.get(user_id, master_id).await?;

        sqlx::query_as(&format!(
            r#"
            SELECT * FROM {}
            WHERE document_id = $1
            ORDER BY created_at_utc DESC, id DESC
            "#,
            self.kind.version_table()
        ))
        .bind(master_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Fetch a single version, verifying it belongs to the user's master.
    pub async fn get_version(
        &self,
        user_id: Uuid,
        master_id: Uuid,
        version_id: Uuid,
    ) -> Result<DocumentVersion> {
        self.get(user_id, master_id).await?;

        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE id = $1 AND document_id = $2",
            self.kind.version_table()
        ))
        .bind(version_id)
        .bind(master_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("version {} not found", version_id)))
    }

    /// Fetch a version by id alone inside an open transaction, without
    /// locking (used by dry runs and previews).
    pub async fn get_version_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        version_id: Uuid,
    ) -> Result<Option<DocumentVersion>> {
        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE id = $1",
            self.kind.version_table()
        ))
        .bind(version_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Fetch a version by id alone inside an open transaction, locking it.
    pub async fn get_version_for_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        version_id: Uuid,
    ) -> Result<Option<DocumentVersion>> {
        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE id = $1 FOR UPDATE",
            self.kind.version_table()
        ))
        .bind(version_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Replace a version's content in place. Label and `is_original` are
    /// never touched by updates.
    pub async fn update_version_content(
        &self,
        user_id: Uuid,
        master_id: Uuid,
        version_id: Uuid,
        content: &str,
    ) -> Result<DocumentVersion> {
        if content.trim().is_empty() {
            return Err(Error::Validation("content must not be empty".to_string()));
        }
        self.get(user_id, master_id).await?;

        let updated: Option<DocumentVersion> = sqlx::query_as(&format!(
            r#"
            UPDATE {}
            SET content = $3, content_hash = $4
            WHERE id = $1 AND document_id = $2
            RETURNING *
            "#,
            self.kind.version_table()
        ))
        .bind(version_id)
        .bind(master_id)
        .bind(content)
        .bind(hash_content(content))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let version =
            updated.ok_or_else(|| Error::NotFound(format!("version {} not found", version_id)))?;

        self.mirror_version(user_id, master_id, &version.label, &version.content)
            .await;

        Ok(version)
    }

    /// Find an existing version whose label carries the company reuse suffix.
    ///
    /// This is the customization dedup lookup. Matches on the literal
    /// `" - {company}"` suffix only; the oldest match wins.
    pub async fn find_version_by_company_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        master_id: Uuid,
        company: &str,
    ) -> Result<Option<DocumentVersion>> {
        let pattern = format!("%{}", escape_like(&labels::company_suffix(company)));

        sqlx::query_as(&format!(
            r#"
            SELECT * FROM {}
            WHERE document_id = $1 AND label LIKE $2 ESCAPE '\'
            ORDER BY created_at_utc ASC, id ASC
            LIMIT 1
            "#,
            self.kind.version_table()
        ))
        .bind(master_id)
        .bind(pattern)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Delete a single version row inside an open transaction.
    pub async fn delete_version_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        version_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1",
            self.kind.version_table()
        ))
        .bind(version_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of every version belonging to a master (used by dependency checks).
    pub async fn version_ids_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        master_id: Uuid,
    ) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(&format!(
            "SELECT id FROM {} WHERE document_id = $1",
            self.kind.version_table()
        ))
        .bind(master_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
