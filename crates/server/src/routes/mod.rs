pub mod auth;
pub mod course;
pub mod health;
pub mod learning;
pub mod profile;
pub mod upload;

use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

/// Routes below `/api`; every one of them expects a validated JWT
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(course::get_courses))
        .route("/courses/mine", get(course::get_my_courses))
        .route(
            "/courses/{id}",
            get(course::get_course_by_id)
                .put(course::save_course)
                .delete(course::delete_course),
        )
        .route("/courses/{id}/published", put(course::set_published))
        .route(
            "/courses/{id}/enrollment",
            post(learning::enroll).delete(learning::unenroll),
        )
        .route("/courses/{id}/progress", get(learning::get_course_progress))
        .route("/enrollments", get(learning::get_enrollments))
        .route("/lessons/{id}/progress", put(learning::mark_lesson))
        .route("/lessons/{id}/events", post(learning::record_event))
        .route(
            "/profiles/me",
            get(profile::get_my_profile).put(profile::put_my_profile),
        )
        .route("/profiles/{id}", get(profile::get_profile))
        .route(
            "/uploads/course-image",
            post(upload::upload_course_image)
                .layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/uploads/lesson-file",
            post(upload::upload_lesson_file)
                .layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)),
        )
        .route("/uploads/{bucket}/{*key}", delete(upload::delete_upload))
}
