//! Integration tests for the application service (link record manager).

use std::sync::Arc;

use dossier_core::{
    ApplicationStatus, CreateApplicationRequest, CreateDocumentRequest, Error,
    ListApplicationsRequest,
};
use dossier_db::test_fixtures::{test_user, TestDatabase};
use dossier_db::Database;
use dossier_engine::ApplicationService;
use dossier_inference::{DocumentTailor, MockGenerationBackend};
use uuid::Uuid;

fn service(db: &Database) -> (ApplicationService, MockGenerationBackend) {
    let mock = MockGenerationBackend::new().with_fixed_response("TAILORED CONTENT");
    let tailor = DocumentTailor::new(Arc::new(mock.clone()));
    (ApplicationService::new(db.clone(), tailor), mock)
}

async fn seed_resume(db: &Database, user: Uuid) -> (Uuid, Uuid) {
    let (master, version) = db
        .resumes
        .create_with_initial_version(CreateDocumentRequest {
            user_id: user,
            title: "Resume".to_string(),
            content: "# Jane Doe".to_string(),
            is_default: false,
        })
        .await
        .unwrap();
    (master.id, version.id)
}

fn create_req(resume_id: Uuid, resume_version_id: Uuid, company: &str) -> CreateApplicationRequest {
    CreateApplicationRequest {
        company: company.to_string(),
        position: "Engineer".to_string(),
        job_description: "jd".to_string(),
        resume_id,
        resume_version_id,
        customize_resume: false,
        additional_instructions: None,
        cover_letter_id: None,
        generate_cover_letter: false,
        customize_cover_letter: false,
        status: None,
        applied_date: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_create_application_defaults() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (resume_id, version_id) = seed_resume(&test_db.db, user).await;
    let (apps, mock) = service(&test_db.db);

    let app = apps
        .create_application(user, create_req(resume_id, version_id, "Acme"))
        .await
        .unwrap();

    assert_eq!(app.status, ApplicationStatus::Applied);
    assert_eq!(app.resume_version_id, version_id);
    assert!(app.customized_resume_version_id.is_none());
    assert!(app.cover_letter_id.is_none());
    // No customization requested, no generation call made.
    assert_eq!(mock.call_count(), 0);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_create_application_with_customization_sets_owned_ref() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (resume_id, version_id) = seed_resume(&test_db.db, user).await;
    let (apps, mock) = service(&test_db.db);

    let mut req = create_req(resume_id, version_id, "Acme");
    req.customize_resume = true;
    let app = apps.create_application(user, req).await.unwrap();

    // The protected reference stays on the original; the owned reference
    // points at the generated version.
    assert_eq!(app.resume_version_id, version_id);
    let customized_id = app.customized_resume_version_id.unwrap();
    assert_ne!(customized_id, version_id);
    assert_eq!(mock.call_count(), 1);

    let customized = test_db
        .db
        .resumes
        .get_version(user, resume_id, customized_id)
        .await
        .unwrap();
    assert_eq!(customized.label, "v2 - Acme");
    assert!(!customized.is_original);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_create_application_validates_inputs() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (resume_id, version_id) = seed_resume(&test_db.db, user).await;
    let (apps, _) = service(&test_db.db);

    // Version from someone else's resume.
    let err = apps
        .create_application(test_user(), create_req(resume_id, version_id, "Acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // Nonexistent version id.
    let err = apps
        .create_application(user, create_req(resume_id, Uuid::new_v4(), "Acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // Empty company.
    let err = apps
        .create_application(user, create_req(resume_id, version_id, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // Nonexistent cover letter.
    let mut req = create_req(resume_id, version_id, "Acme");
    req.cover_letter_id = Some(Uuid::new_v4());
    let err = apps.create_application(user, req).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_status_and_list_filter() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (resume_id, version_id) = seed_resume(&test_db.db, user).await;
    let (apps, _) = service(&test_db.db);

    let app = apps
        .create_application(user, create_req(resume_id, version_id, "Acme"))
        .await
        .unwrap();
    apps.create_application(user, create_req(resume_id, version_id, "Globex"))
        .await
        .unwrap();

    let updated = apps
        .update_status(
            user,
            app.id,
            ApplicationStatus::Interviewing,
            Some("recruiter call done".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ApplicationStatus::Interviewing);
    assert_eq!(updated.notes.as_deref(), Some("recruiter call done"));

    let interviewing = apps
        .list_applications(
            user,
            ListApplicationsRequest {
                status: Some(ApplicationStatus::Interviewing),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(interviewing.total, 1);
    assert_eq!(interviewing.applications[0].id, app.id);

    let stats = apps.application_stats(user).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.interviewing, 1);
    assert_eq!(stats.applied, 1);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_attach_and_remove_cover_letter() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (resume_id, version_id) = seed_resume(&test_db.db, user).await;
    let (apps, _) = service(&test_db.db);

    let app = apps
        .create_application(user, create_req(resume_id, version_id, "Acme"))
        .await
        .unwrap();

    let (cover_letter, cl_version) = test_db
        .db
        .cover_letters
        .create_with_initial_version(CreateDocumentRequest {
            user_id: user,
            title: "Cover Letter".to_string(),
            content: "Dear team".to_string(),
            is_default: false,
        })
        .await
        .unwrap();

    let attached = apps
        .attach_cover_letter(user, app.id, cover_letter.id)
        .await
        .unwrap();
    assert_eq!(attached.cover_letter_id, Some(cover_letter.id));
    assert_eq!(attached.cover_letter_version_id, Some(cl_version.id));

    let detached = apps.remove_cover_letter(user, app.id).await.unwrap();
    assert!(detached.cover_letter_id.is_none());
    assert!(detached.cover_letter_version_id.is_none());

    // The cover letter itself is untouched.
    assert!(test_db.db.cover_letters.get(user, cover_letter.id).await.is_ok());

    test_db.cleanup().await;
}
