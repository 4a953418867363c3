//! Core data models for dossier.
//!
//! The document graph has three tiers: master documents (resumes and cover
//! letters), their versions, and applications linking a version pair to a
//! company/position. Versions are flat snapshots; there is no diffing or
//! branching. An application holds references with distinct deletion
//! semantics, tagged by [`ReferenceKind`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// DOCUMENT FAMILY
// =============================================================================

/// Which master-document family an operation targets.
///
/// Both families share one shape and one repository implementation; the kind
/// selects the table pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    /// Master table name for this family.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CoverLetter => "cover_letter",
        }
    }

    /// Version table name for this family.
    pub fn version_table(&self) -> &'static str {
        match self {
            Self::Resume => "resume_version",
            Self::CoverLetter => "cover_letter_version",
        }
    }

    /// Path segment used by the storage mirror.
    pub fn storage_segment(&self) -> &'static str {
        match self {
            Self::Resume => "resumes",
            Self::CoverLetter => "cover_letters",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resume => write!(f, "resume"),
            Self::CoverLetter => write!(f, "cover letter"),
        }
    }
}

// =============================================================================
// MASTER DOCUMENTS AND VERSIONS
// =============================================================================

/// A master document record (resume or cover letter).
///
/// Owns its versions exclusively: deleting the master deletes every version.
/// Once any write workflow completes, a master always has at least one
/// version.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MasterDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub is_default: bool,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// A content snapshot of a master document.
///
/// `is_original` marks versions created by the owner directly (the `"v1"`
/// created with the master, or later uploads); customized versions generated
/// against a job description carry `is_original = false` and the job
/// description they were generated from.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Version label, e.g. `"v1"`, `"v3 - Acme Corp"`.
    pub label: String,
    pub content: String,
    /// SHA-256 of `content`, `"sha256:<hex>"`.
    pub content_hash: String,
    pub job_description: Option<String>,
    pub is_original: bool,
    pub created_at_utc: DateTime<Utc>,
}

/// Request for creating a master document with its initial version.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_default: bool,
}

/// Request for updating master-document metadata.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub is_default: Option<bool>,
}

// =============================================================================
// APPLICATIONS
// =============================================================================

/// Lifecycle status of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status")]
pub enum ApplicationStatus {
    Applied,
    Interviewing,
    Rejected,
    Offer,
    Withdrawn,
}

impl ApplicationStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ApplicationStatus; 5] = [
        Self::Applied,
        Self::Interviewing,
        Self::Rejected,
        Self::Offer,
        Self::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Interviewing => "Interviewing",
            Self::Rejected => "Rejected",
            Self::Offer => "Offer",
            Self::Withdrawn => "Withdrawn",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Applied" => Ok(Self::Applied),
            "Interviewing" => Ok(Self::Interviewing),
            "Rejected" => Ok(Self::Rejected),
            "Offer" => Ok(Self::Offer),
            "Withdrawn" => Ok(Self::Withdrawn),
            other => Err(crate::error::Error::Validation(format!(
                "Invalid status '{}'. Valid options: Applied, Interviewing, Rejected, Offer, Withdrawn",
                other
            ))),
        }
    }
}

/// Deletion semantics of an application's references to versions/masters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Blocks deletion of the referenced version while the application exists.
    Protected,
    /// Deleted along with the application, unless another application shares it.
    OwnedForCascade,
    /// Cleared (set to NULL) when the referenced master is deleted.
    NullableOnDelete,
}

/// A job-application record tying document versions to a company/position.
///
/// Reference semantics:
/// - `resume_version_id` — protected, mandatory
/// - `customized_resume_version_id` — owned for cascade
/// - `cover_letter_version_id` — protected
/// - `customized_cover_letter_version_id` — owned for cascade
/// - `cover_letter_id` — master reference, nulled when the master is deleted
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
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
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Request for creating an application, optionally customizing documents.
#[derive(Debug, Clone)]
pub struct CreateApplicationRequest {
    pub company: String,
    pub position: String,
    pub job_description: String,
    /// Master resume the original version belongs to.
    pub resume_id: Uuid,
    /// The original (protected) resume version to apply with.
    pub resume_version_id: Uuid,
    /// Generate a company-customized resume version.
    pub customize_resume: bool,
    pub additional_instructions: Option<String>,
    /// Attach an existing cover letter (its current original version).
    pub cover_letter_id: Option<Uuid>,
    /// Generate a fresh cover letter master for this application.
    pub generate_cover_letter: bool,
    /// Customize the attached cover letter for the company.
    pub customize_cover_letter: bool,
    pub status: Option<ApplicationStatus>,
    pub applied_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Field patch for an application. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateApplicationRequest {
    pub company: Option<String>,
    pub position: Option<String>,
    pub job_description: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub applied_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub additional_instructions: Option<String>,
}

/// Filters and pagination for listing applications.
#[derive(Debug, Clone, Default)]
pub struct ListApplicationsRequest {
    pub status: Option<ApplicationStatus>,
    /// Case-insensitive substring match on company.
    pub company: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for listing applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListApplicationsResponse {
    pub applications: Vec<Application>,
    pub total: i64,
}

/// Per-status application counts for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total: i64,
    pub applied: i64,
    pub interviewing: i64,
    pub rejected: i64,
    pub offers: i64,
    pub withdrawn: i64,
    /// Applications whose applied date falls in the trailing 30-day window.
    pub recent_month: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_document_kind_tables() {
        assert_eq!(DocumentKind::Resume.table(), "resume");
        assert_eq!(DocumentKind::Resume.version_table(), "resume_version");
        assert_eq!(DocumentKind::CoverLetter.table(), "cover_letter");
        assert_eq!(
            DocumentKind::CoverLetter.version_table(),
            "cover_letter_version"
        );
    }

    #[test]
    fn test_status_roundtrip() {
        for status in ApplicationStatus::ALL {
            let parsed = ApplicationStatus::from_str(status.as_str()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = ApplicationStatus::from_str("Ghosted").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Invalid status 'Ghosted'"));
        assert!(msg.contains("Withdrawn"));
    }

    #[test]
    fn test_status_parse_is_case_sensitive() {
        // The closed set is exact; lowercase input is caller error.
        assert!(ApplicationStatus::from_str("applied").is_err());
    }

    #[test]
    fn test_status_serde_uses_variant_names() {
        let json = serde_json::to_string(&ApplicationStatus::Interviewing).unwrap();
        assert_eq!(json, "\"Interviewing\"");
    }
}
