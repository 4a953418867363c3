//! Integration tests for the application repository.

use chrono::NaiveDate;
use dossier_core::{
    ApplicationStatus, CreateDocumentRequest, DocumentKind, Error, ListApplicationsRequest,
    UpdateApplicationRequest,
};
use dossier_db::test_fixtures::{test_user, TestDatabase};
use dossier_db::{Database, NewApplication};
use uuid::Uuid;

async fn seed_resume(db: &Database, user: Uuid) -> (Uuid, Uuid) {
    let (master, version) = db
        .resumes
        .create_with_initial_version(CreateDocumentRequest {
            user_id: user,
            title: "Resume".to_string(),
            content: "# content".to_string(),
            is_default: false,
        })
        .await
        .unwrap();
    (master.id, version.id)
}

fn new_app(user: Uuid, resume_version_id: Uuid, company: &str, date: NaiveDate) -> NewApplication {
    NewApplication {
        user_id: user,
        resume_version_id,
        customized_resume_version_id: None,
        cover_letter_id: None,
        cover_letter_version_id: None,
        customized_cover_letter_version_id: None,
        company: company.to_string(),
        position: "Engineer".to_string(),
        job_description: Some("build things".to_string()),
        additional_instructions: None,
        status: ApplicationStatus::Applied,
        applied_date: date,
        notes: None,
    }
}

async fn insert_app(db: &Database, new: NewApplication) -> dossier_core::Application {
    let mut tx = db.pool().begin().await.unwrap();
    let app = db.applications.insert_tx(&mut tx, new).await.unwrap();
    tx.commit().await.unwrap();
    app
}

#[tokio::test]
async fn test_insert_and_fetch_ownership() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (_, version_id) = seed_resume(&test_db.db, user).await;

    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let app = insert_app(&test_db.db, new_app(user, version_id, "Acme", date)).await;

    let fetched = test_db.db.applications.fetch(user, app.id).await.unwrap();
    assert_eq!(fetched.company, "Acme");
    assert_eq!(fetched.status, ApplicationStatus::Applied);
    assert_eq!(fetched.applied_date, date);

    // Another owner's fetch is indistinguishable from absence.
    let err = test_db
        .db
        .applications
        .fetch(test_user(), app.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ApplicationNotFound(_)));

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (_, version_id) = seed_resume(&test_db.db, user).await;

    for (i, (company, status)) in [
        ("Acme", ApplicationStatus::Applied),
        ("Acme", ApplicationStatus::Rejected),
        ("Globex", ApplicationStatus::Applied),
    ]
    .iter()
    .enumerate()
    {
        let date = NaiveDate::from_ymd_opt(2026, 7, (i + 1) as u32).unwrap();
        let mut new = new_app(user, version_id, company, date);
        new.status = *status;
        insert_app(&test_db.db, new).await;
    }

    let all = test_db
        .db
        .applications
        .list(user, ListApplicationsRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    // Most recent applied date first.
    assert_eq!(all.applications[0].company, "Globex");

    let acme = test_db
        .db
        .applications
        .list(
            user,
            ListApplicationsRequest {
                company: Some("acme".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(acme.total, 2);

    let applied = test_db
        .db
        .applications
        .list(
            user,
            ListApplicationsRequest {
                status: Some(ApplicationStatus::Applied),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(applied.total, 2);

    let page = test_db
        .db
        .applications
        .list(
            user,
            ListApplicationsRequest {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.applications.len(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_search_spans_fields() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (_, version_id) = seed_resume(&test_db.db, user).await;

    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let mut with_notes = new_app(user, version_id, "Acme", date);
    with_notes.notes = Some("phone screen with platform team".to_string());
    insert_app(&test_db.db, with_notes).await;
    insert_app(&test_db.db, new_app(user, version_id, "Globex", date)).await;

    let hits = test_db
        .db
        .applications
        .search(user, "platform", 20, 0)
        .await
        .unwrap();
    assert_eq!(hits.total, 1);
    assert_eq!(hits.applications[0].company, "Acme");

    let hits = test_db
        .db
        .applications
        .search(user, "globex", 20, 0)
        .await
        .unwrap();
    assert_eq!(hits.total, 1);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_update_patches_only_given_fields() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (_, version_id) = seed_resume(&test_db.db, user).await;
    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let app = insert_app(&test_db.db, new_app(user, version_id, "Acme", date)).await;

    let updated = test_db
        .db
        .applications
        .update(
            user,
            app.id,
            UpdateApplicationRequest {
                status: Some(ApplicationStatus::Interviewing),
                notes: Some("onsite scheduled".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ApplicationStatus::Interviewing);
    assert_eq!(updated.notes.as_deref(), Some("onsite scheduled"));
    assert_eq!(updated.company, "Acme");
    assert_eq!(updated.position, "Engineer");
    assert!(updated.updated_at_utc >= app.updated_at_utc);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_stats_counts_by_status_and_window() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (_, version_id) = seed_resume(&test_db.db, user).await;

    let today = NaiveDate::from_ymd_opt(2026, 7, 22).unwrap();
    let recent = today - chrono::Duration::days(3);
    let stale = today - chrono::Duration::days(90);

    for (status, date) in [
        (ApplicationStatus::Applied, recent),
        (ApplicationStatus::Offer, recent),
        (ApplicationStatus::Rejected, stale),
    ] {
        let mut new = new_app(user, version_id, "Acme", date);
        new.status = status;
        insert_app(&test_db.db, new).await;
    }

    let stats = test_db.db.applications.stats(user, today).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.offers, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.interviewing, 0);
    assert_eq!(stats.recent_month, 2);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_reference_counting_queries() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (master_id, version_id) = seed_resume(&test_db.db, user).await;

    // A customized version shared between two applications.
    let customized = {
        let mut tx = test_db.db.pool().begin().await.unwrap();
        let v = test_db
            .db
            .resumes
            .insert_version_tx(&mut tx, master_id, "v2 - Acme", "b", Some("jd"), false)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        v
    };

    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let mut first = new_app(user, version_id, "Acme", date);
    first.customized_resume_version_id = Some(customized.id);
    let first = insert_app(&test_db.db, first).await;

    let mut second = new_app(user, version_id, "Acme", date);
    second.customized_resume_version_id = Some(customized.id);
    let second = insert_app(&test_db.db, second).await;

    let mut tx = test_db.db.pool().begin().await.unwrap();

    let others = test_db
        .db
        .applications
        .count_other_references_tx(&mut tx, DocumentKind::Resume, customized.id, Some(first.id))
        .await
        .unwrap();
    assert_eq!(others, 1);

    let all = test_db
        .db
        .applications
        .count_other_references_tx(&mut tx, DocumentKind::Resume, customized.id, None)
        .await
        .unwrap();
    assert_eq!(all, 2);

    // Both applications hold protected references to v1.
    let protected = test_db
        .db
        .applications
        .protected_referencing_version_tx(&mut tx, DocumentKind::Resume, version_id)
        .await
        .unwrap();
    assert_eq!(protected.len(), 2);

    // Master-level blocking traces through the version chain.
    let blocking = test_db
        .db
        .applications
        .blocking_master_tx(&mut tx, DocumentKind::Resume, master_id)
        .await
        .unwrap();
    let mut ids: Vec<_> = blocking.iter().map(|a| a.id).collect();
    ids.sort();
    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(ids, expected);

    test_db.cleanup().await;
}

#[tokio::test]
async fn test_cover_letter_master_reference_blocks() {
    dotenvy::dotenv().ok();
    let test_db = TestDatabase::new().await;
    let user = test_user();
    let (_, resume_version_id) = seed_resume(&test_db.db, user).await;

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

    let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
    let mut new = new_app(user, resume_version_id, "Acme", date);
    new.cover_letter_id = Some(cover_letter.id);
    new.cover_letter_version_id = Some(cl_version.id);
    let app = insert_app(&test_db.db, new).await;

    let mut tx = test_db.db.pool().begin().await.unwrap();
    let blocking = test_db
        .db
        .applications
        .blocking_master_tx(&mut tx, DocumentKind::CoverLetter, cover_letter.id)
        .await
        .unwrap();
    assert_eq!(blocking.len(), 1);
    assert_eq!(blocking[0].id, app.id);

    test_db.cleanup().await;
}
