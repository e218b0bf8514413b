//! Integration tests for the student side: catalog, enrollment, progress and
//! profiles

mod common;

use common::{row_counts, sample_course, setup_db};
use database::{
    entities::{enrollments, profiles::Role},
    error::ServiceError,
    services::{
        course::CourseService,
        enrollment::EnrollmentService,
        profile::{ProfileService, ProfileUpdate},
        progress::ProgressService,
        query_course::QueryCourseService,
        save_course::SaveCourseService,
    },
};
use models::{progress::CompletionEvent, tree::CourseTree};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

async fn published_course(db: &DatabaseConnection, teacher: Uuid) -> CourseTree {
    let mut tree = sample_course(teacher);
    tree.set_published(true);
    SaveCourseService::save_course_tree(db, teacher, &tree)
        .await
        .unwrap();
    tree
}

#[tokio::test]
async fn test_enroll_twice_keeps_one_row() {
    let db = setup_db().await;
    let course = published_course(&db, Uuid::new_v4()).await;
    let student = Uuid::new_v4();

    let first = EnrollmentService::enroll(&db, student, course.id)
        .await
        .unwrap();
    let second = EnrollmentService::enroll(&db, student, course.id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(enrollments::Entity::find().count(&db).await.unwrap(), 1);
    assert!(
        EnrollmentService::is_enrolled(&db, student, course.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_cannot_enroll_in_someone_elses_draft() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();
    let draft = sample_course(teacher);
    SaveCourseService::save_course_tree(&db, teacher, &draft)
        .await
        .unwrap();

    let err = EnrollmentService::enroll(&db, Uuid::new_v4(), draft.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("course")));
}

#[tokio::test]
async fn test_unenroll_and_listing() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();
    let course = published_course(&db, teacher).await;
    let student = Uuid::new_v4();

    EnrollmentService::enroll(&db, student, course.id)
        .await
        .unwrap();
    let listed = EnrollmentService::list_for_student(&db, student)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.id, course.id);

    // Unpublished courses drop out of the student's list
    CourseService::set_published(&db, teacher, course.id, false)
        .await
        .unwrap();
    assert!(
        EnrollmentService::list_for_student(&db, student)
            .await
            .unwrap()
            .is_empty()
    );

    assert!(
        EnrollmentService::unenroll(&db, student, course.id)
            .await
            .unwrap()
    );
    assert!(
        !EnrollmentService::unenroll(&db, student, course.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_mark_complete_twice_keeps_one_row() {
    let db = setup_db().await;
    let course = published_course(&db, Uuid::new_v4()).await;
    let student = Uuid::new_v4();
    let lesson = course.modules[0].lessons[0].id;

    let first = ProgressService::mark_lesson(&db, student, lesson, true)
        .await
        .unwrap();
    let second = ProgressService::mark_lesson(&db, student, lesson, true)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.completed);
    assert_eq!(row_counts(&db).await.progress, 1);

    let reverted = ProgressService::mark_lesson(&db, student, lesson, false)
        .await
        .unwrap();
    assert!(!reverted.completed);
    assert_eq!(row_counts(&db).await.progress, 1);
}

#[tokio::test]
async fn test_video_events_complete_past_threshold() {
    let db = setup_db().await;
    let course = published_course(&db, Uuid::new_v4()).await;
    let student = Uuid::new_v4();
    let lesson = course.modules[0].lessons[0].id;

    let early = ProgressService::record_event(
        &db,
        student,
        lesson,
        CompletionEvent::VideoProgress {
            position_secs: 30.0,
            duration_secs: 100.0,
        },
    )
    .await
    .unwrap();
    assert!(early.is_none());
    assert_eq!(row_counts(&db).await.progress, 0);

    let done = ProgressService::record_event(
        &db,
        student,
        lesson,
        CompletionEvent::VideoProgress {
            position_secs: 95.0,
            duration_secs: 100.0,
        },
    )
    .await
    .unwrap()
    .expect("lesson should be completed");
    assert!(done.completed);
}

#[tokio::test]
async fn test_course_progress_summary() {
    let db = setup_db().await;
    let course = published_course(&db, Uuid::new_v4()).await;
    let student = Uuid::new_v4();
    let lesson = course.modules[1].lessons[0].id;

    ProgressService::record_event(&db, student, lesson, CompletionEvent::DocumentOpened)
        .await
        .unwrap();

    let summary = ProgressService::course_progress(&db, student, course.id)
        .await
        .unwrap();
    assert_eq!(summary.progress.total_lessons, 3);
    assert_eq!(summary.progress.completed_lessons, 1);
    assert_eq!(summary.progress.percent, 33);
    assert_eq!(summary.completed_lesson_ids, vec![lesson]);

    // Another student's progress is separate
    let other = ProgressService::course_progress(&db, Uuid::new_v4(), course.id)
        .await
        .unwrap();
    assert_eq!(other.progress.completed_lessons, 0);
}

#[tokio::test]
async fn test_progress_on_hidden_lesson_is_not_found() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();
    let draft = sample_course(teacher);
    SaveCourseService::save_course_tree(&db, teacher, &draft)
        .await
        .unwrap();

    let lesson = draft.modules[0].lessons[0].id;
    let err = ProgressService::mark_lesson(&db, Uuid::new_v4(), lesson, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("lesson")));

    let err = ProgressService::mark_lesson(&db, teacher, Uuid::new_v4(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("lesson")));
}

#[tokio::test]
async fn test_deleted_lesson_takes_progress_with_it() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();
    let mut course = published_course(&db, teacher).await;
    let student = Uuid::new_v4();
    let lesson = course.modules[0].lessons[0].id;

    ProgressService::mark_lesson(&db, student, lesson, true)
        .await
        .unwrap();
    course.delete_lesson(lesson).unwrap();
    SaveCourseService::save_course_tree(&db, teacher, &course)
        .await
        .unwrap();

    assert_eq!(row_counts(&db).await.progress, 0);
}

#[tokio::test]
async fn test_delete_course_cascades() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();
    let course = published_course(&db, teacher).await;
    let student = Uuid::new_v4();
    EnrollmentService::enroll(&db, student, course.id)
        .await
        .unwrap();
    ProgressService::mark_lesson(&db, student, course.modules[0].lessons[0].id, true)
        .await
        .unwrap();

    // Students may read but not delete
    let err = CourseService::delete_course(&db, student, course.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    CourseService::delete_course(&db, teacher, course.id)
        .await
        .unwrap();

    let counts = row_counts(&db).await;
    assert_eq!(counts.courses, 0);
    assert_eq!(counts.modules, 0);
    assert_eq!(counts.lessons, 0);
    assert_eq!(counts.progress, 0);
    assert_eq!(enrollments::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_drafts_are_visible_to_owner_only() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();
    let draft = sample_course(teacher);
    SaveCourseService::save_course_tree(&db, teacher, &draft)
        .await
        .unwrap();

    assert!(
        QueryCourseService::get_course_tree(&db, Uuid::new_v4(), draft.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        QueryCourseService::get_course_tree(&db, teacher, draft.id)
            .await
            .unwrap()
            .is_some()
    );

    let owned = QueryCourseService::list_owned(&db, teacher).await.unwrap();
    assert_eq!(owned.len(), 1);
    let (catalog, total) = QueryCourseService::list_published(&db, 1, 20, None, None)
        .await
        .unwrap();
    assert!(catalog.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_catalog_filters_and_pages() {
    let db = setup_db().await;
    let teacher = Uuid::new_v4();

    for (title, category) in [
        ("Rust basics", "programming"),
        ("Advanced Rust", "programming"),
        ("Watercolor", "art"),
    ] {
        let mut tree = CourseTree::new(teacher, title);
        tree.set_details(format!("{title} course"), category);
        tree.set_published(true);
        SaveCourseService::save_course_tree(&db, teacher, &tree)
            .await
            .unwrap();
    }

    let (art, total) =
        QueryCourseService::list_published(&db, 1, 20, Some(vec!["art".into()]), None)
            .await
            .unwrap();
    assert_eq!(total, 1);
    assert_eq!(art[0].title, "Watercolor");

    let (rust, total) =
        QueryCourseService::list_published(&db, 1, 20, None, Some("Rust".into()))
            .await
            .unwrap();
    assert_eq!(total, 2);
    assert_eq!(rust.len(), 2);

    let (page_one, total) = QueryCourseService::list_published(&db, 1, 2, None, None)
        .await
        .unwrap();
    let (page_two, _) = QueryCourseService::list_published(&db, 2, 2, None, None)
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page_one.len(), 2);
    assert_eq!(page_two.len(), 1);
    assert!(page_one.iter().all(|c| c.id != page_two[0].id));
}

#[tokio::test]
async fn test_profile_upsert_and_get() {
    let db = setup_db().await;
    let subject = Uuid::new_v4();

    let created = ProfileService::upsert_own(
        &db,
        subject,
        ProfileUpdate {
            display_name: "  Ada  ".into(),
            role: Role::Teacher,
            avatar_url: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.display_name, "Ada");
    assert_eq!(created.role, Role::Teacher);

    let updated = ProfileService::upsert_own(
        &db,
        subject,
        ProfileUpdate {
            display_name: "Ada L.".into(),
            role: Role::Teacher,
            avatar_url: Some("https://cdn.example/ada.png".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.display_name, "Ada L.");
    assert_eq!(updated.created_at, created.created_at);

    // Anyone signed in can read it
    let read = ProfileService::get(&db, Uuid::new_v4(), subject)
        .await
        .unwrap();
    assert_eq!(read, updated);

    let err = ProfileService::get(&db, subject, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("profile")));
}

#[tokio::test]
async fn test_profile_rejects_blank_name() {
    let db = setup_db().await;
    let err = ProfileService::upsert_own(
        &db,
        Uuid::new_v4(),
        ProfileUpdate {
            display_name: "   ".into(),
            role: Role::Student,
            avatar_url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
}
