//! Application service: create and manage link records.
//!
//! Creation is the write path that ties the graph together: it validates the
//! protected resume reference, optionally produces a customized resume
//! version, and optionally attaches, customizes, or generates a cover
//! letter. A cover-letter generation failure is logged and the application
//! is still created; a resume customization failure aborts the creation.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use dossier_core::{
    Application, ApplicationStats, ApplicationStatus, CreateApplicationRequest, DocumentKind,
    DocumentVersion, Error, ListApplicationsRequest, ListApplicationsResponse, Result,
    UpdateApplicationRequest,
};
use dossier_db::{Database, NewApplication};
use dossier_inference::DocumentTailor;

use crate::customize::CustomizationService;

/// Service for application lifecycle operations other than deletion.
#[derive(Clone)]
pub struct ApplicationService {
    db: Database,
    customizer: CustomizationService,
    tailor: DocumentTailor,
}

impl ApplicationService {
    /// Create a new application service.
    pub fn new(db: Database, tailor: DocumentTailor) -> Self {
        let customizer = CustomizationService::new(db.clone(), tailor.clone());
        Self {
            db,
            customizer,
            tailor,
        }
    }

    /// The customization engine used for document tailoring.
    pub fn customizer(&self) -> &CustomizationService {
        &self.customizer
    }

    /// Create an application, optionally customizing its documents.
    pub async fn create_application(
        &self,
        user_id: Uuid,
        req: CreateApplicationRequest,
    ) -> Result<Application> {
        if req.company.trim().is_empty() {
            return Err(Error::Validation("company must not be empty".to_string()));
        }
        if req.position.trim().is_empty() {
            return Err(Error::Validation("position must not be empty".to_string()));
        }

        // The mandatory protected reference must resolve to a version of the
        // caller's own master.
        let original_version = self
            .db
            .resumes
            .get_version(user_id, req.resume_id, req.resume_version_id)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) | Error::DocumentNotFound(_) => {
                    Error::Validation("invalid original resume version".to_string())
                }
                other => other,
            })?;

        let customized_resume_version = if req.customize_resume {
            let outcome = self
                .customizer
                .customize_for_application(
                    user_id,
                    DocumentKind::Resume,
                    req.resume_id,
                    req.resume_version_id,
                    &req.job_description,
                    &req.company,
                    req.additional_instructions.as_deref(),
                )
                .await?;
            Some(outcome.into_version())
        } else {
            None
        };

        let (cover_letter_id, cover_letter_version_id, customized_cover_letter_version_id) = self
            .resolve_cover_letter(user_id, &req, &original_version, &customized_resume_version)
            .await?;

        let mut tx = self.db.pool().begin().await.map_err(Error::Database)?;
        let application = self
            .db
            .applications
            .insert_tx(
                &mut tx,
                NewApplication {
                    user_id,
                    resume_version_id: req.resume_version_id,
                    customized_resume_version_id: customized_resume_version
                        .as_ref()
                        .map(|v| v.id),
                    cover_letter_id,
                    cover_letter_version_id,
                    customized_cover_letter_version_id,
                    company: req.company.clone(),
                    position: req.position.clone(),
                    job_description: Some(req.job_description.clone()),
                    additional_instructions: req.additional_instructions.clone(),
                    status: req.status.unwrap_or(ApplicationStatus::Applied),
                    applied_date: req.applied_date.unwrap_or_else(|| Utc::now().date_naive()),
                    notes: req.notes.clone(),
                },
            )
            .await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "applications",
            op = "create",
            application_id = %application.id,
            user_id = %user_id,
            company = %application.company,
            customized = customized_resume_version.is_some(),
            "Created application"
        );

        Ok(application)
    }

    /// Resolve the three cover-letter references for a new application.
    async fn resolve_cover_letter(
        &self,
        user_id: Uuid,
        req: &CreateApplicationRequest,
        original_version: &DocumentVersion,
        customized_resume_version: &Option<DocumentVersion>,
    ) -> Result<(Option<Uuid>, Option<Uuid>, Option<Uuid>)> {
        if let Some(cover_letter_id) = req.cover_letter_id {
            self.db
                .cover_letters
                .get(user_id, cover_letter_id)
                .await
                .map_err(|e| match e {
                    Error::DocumentNotFound(_) => {
                        Error::Validation("invalid cover letter".to_string())
                    }
                    other => other,
                })?;

            let versions = self
                .db
                .cover_letters
                .list_versions(user_id, cover_letter_id)
                .await?;
            // Prefer the newest original; a master always has >= 1 version.
            let attached = versions
                .iter()
                .find(|v| v.is_original)
                .or_else(|| versions.first())
                .ok_or_else(|| Error::Validation("cover letter has no versions".to_string()))?;

            let customized = if req.customize_cover_letter {
                let outcome = self
                    .customizer
                    .customize_for_application(
                        user_id,
                        DocumentKind::CoverLetter,
                        cover_letter_id,
                        attached.id,
                        &req.job_description,
                        &req.company,
                        req.additional_instructions.as_deref(),
                    )
                    .await?;
                Some(outcome.into_version().id)
            } else {
                None
            };

            return Ok((Some(cover_letter_id), Some(attached.id), customized));
        }

        if req.generate_cover_letter {
            let resume_content = customized_resume_version
                .as_ref()
                .map(|v| v.content.as_str())
                .unwrap_or(&original_version.content);

            match self
                .tailor
                .draft_cover_letter(
                    resume_content,
                    &req.job_description,
                    &req.company,
                    &req.position,
                    req.additional_instructions.as_deref(),
                )
                .await
            {
                Ok(content) => {
                    let (master, version) = self
                        .db
                        .cover_letters
                        .create_with_initial_version(dossier_core::CreateDocumentRequest {
                            user_id,
                            title: format!("Cover Letter - {} - {}", req.company, req.position),
                            content,
                            is_default: false,
                        })
                        .await?;
                    return Ok((Some(master.id), Some(version.id), None));
                }
                Err(e) => {
                    warn!(
                        subsystem = "applications",
                        op = "generate_cover_letter",
                        user_id = %user_id,
                        company = %req.company,
                        error = %e,
                        "Cover letter generation failed; creating application without it"
                    );
                }
            }
        }

        Ok((None, None, None))
    }

    /// Fetch an application, verifying ownership.
    pub async fn get_application(&self, user_id: Uuid, id: Uuid) -> Result<Application> {
        self.db.applications.fetch(user_id, id).await
    }

    /// List applications with filters and pagination.
    pub async fn list_applications(
        &self,
        user_id: Uuid,
        req: ListApplicationsRequest,
    ) -> Result<ListApplicationsResponse> {
        self.db.applications.list(user_id, req).await
    }

    /// Search applications across company, position, description, and notes.
    pub async fn search_applications(
        &self,
        user_id: Uuid,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<ListApplicationsResponse> {
        self.db.applications.search(user_id, query, limit, offset).await
    }

    /// Patch application fields.
    pub async fn update_application(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: UpdateApplicationRequest,
    ) -> Result<Application> {
        self.db.applications.update(user_id, id, req).await
    }

    /// Update the lifecycle status, optionally replacing notes.
    pub async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        let updated = self
            .db
            .applications
            .update(
                user_id,
                id,
                UpdateApplicationRequest {
                    status: Some(status),
                    notes,
                    ..Default::default()
                },
            )
            .await?;

        info!(
            subsystem = "applications",
            op = "update_status",
            application_id = %id,
            status = %status,
            "Updated application status"
        );
        Ok(updated)
    }

    /// Attach an existing cover letter to an application.
    pub async fn attach_cover_letter(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        cover_letter_id: Uuid,
    ) -> Result<Application> {
        self.db.applications.fetch(user_id, application_id).await?;
        self.db.cover_letters.get(user_id, cover_letter_id).await?;

        let versions = self
            .db
            .cover_letters
            .list_versions(user_id, cover_letter_id)
            .await?;
        let attached = versions
            .iter()
            .find(|v| v.is_original)
            .or_else(|| versions.first())
            .ok_or_else(|| Error::Validation("cover letter has no versions".to_string()))?;

        self.db
            .applications
            .set_cover_letter_refs(
                user_id,
                application_id,
                Some(cover_letter_id),
                Some(attached.id),
                None,
            )
            .await
    }

    /// Detach any cover letter from an application.
    ///
    /// Clears the references only; the cover letter and its versions are
    /// left in place.
    pub async fn remove_cover_letter(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<Application> {
        self.db
            .applications
            .set_cover_letter_refs(user_id, application_id, None, None, None)
            .await
    }

    /// Per-status counts and a trailing 30-day activity count.
    pub async fn application_stats(&self, user_id: Uuid) -> Result<ApplicationStats> {
        self.db
            .applications
            .stats(user_id, Utc::now().date_naive())
            .await
    }
}
