use crate::{
    dtos::learning::{
        CompletionEventRequest, CourseProgressResponse, EnrollmentResponse, EventResponse,
        MarkProgressRequest, ProgressResponse,
    },
    error::ApiError,
    routes::auth::caller_id,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use database::services::{enrollment::EnrollmentService, progress::ProgressService};
use tower_oauth2_resource_server::claims::DefaultClaims;
use uuid::Uuid;

/// Enroll the caller in a course
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enrollment",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Enrolled; repeating the call is harmless", body = EnrollmentResponse),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Learning"
)]
pub async fn enroll(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let enrollment = EnrollmentService::enroll(&state.db, caller, id).await?;
    Ok(Json(EnrollmentResponse::new(enrollment, None)))
}

/// Remove the caller's enrollment in a course
#[utoipa::path(
    delete,
    path = "/api/courses/{id}/enrollment",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Enrollment removed"),
        (status = 404, description = "Caller was not enrolled")
    ),
    security(("jwt" = [])),
    tag = "Learning"
)]
pub async fn unenroll(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let caller = caller_id(&claims)?;

    if EnrollmentService::unenroll(&state.db, caller, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("enrollment"))
    }
}

/// List the caller's enrollments, newest first
#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses(
        (status = 200, description = "Enrollments of the caller", body = Vec<EnrollmentResponse>)
    ),
    security(("jwt" = [])),
    tag = "Learning"
)]
pub async fn get_enrollments(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let caller = caller_id(&claims)?;

    let rows = EnrollmentService::list_for_student(&state.db, caller).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(enrollment, course)| EnrollmentResponse::new(enrollment, Some(course)))
            .collect(),
    ))
}

/// Get the caller's completion summary for a course
#[utoipa::path(
    get,
    path = "/api/courses/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Progress summary", body = CourseProgressResponse),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Learning"
)]
pub async fn get_course_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseProgressResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let summary = ProgressService::course_progress(&state.db, caller, id).await?;
    Ok(Json(CourseProgressResponse::new(id, summary)))
}

/// Mark a lesson complete or incomplete for the caller
#[utoipa::path(
    put,
    path = "/api/lessons/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Lesson ID")
    ),
    request_body = MarkProgressRequest,
    responses(
        (status = 200, description = "Progress stored", body = ProgressResponse),
        (status = 404, description = "Lesson not found")
    ),
    security(("jwt" = [])),
    tag = "Learning"
)]
pub async fn mark_lesson(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<MarkProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let row = ProgressService::mark_lesson(&state.db, caller, id, request.completed).await?;
    Ok(Json(row.into()))
}

/// Report a player event; completes the lesson once the threshold is reached
#[utoipa::path(
    post,
    path = "/api/lessons/{id}/events",
    params(
        ("id" = Uuid, Path, description = "Lesson ID")
    ),
    request_body = CompletionEventRequest,
    responses(
        (status = 200, description = "Event applied", body = EventResponse),
        (status = 404, description = "Lesson not found")
    ),
    security(("jwt" = [])),
    tag = "Learning"
)]
pub async fn record_event(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
    Json(event): Json<CompletionEventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let row = ProgressService::record_event(&state.db, caller, id, event.into()).await?;
    Ok(Json(EventResponse {
        completed: row.is_some(),
        progress: row.map(Into::into),
    }))
}
