use crate::{
    dtos::course::{
        CoursePayload, CourseQueryParams, CourseSummaryResponse, PaginatedCoursesResponse,
        PaginationMeta, PublishRequest,
    },
    error::ApiError,
    routes::auth::caller_id,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use database::services::{
    course::CourseService, query_course::QueryCourseService, save_course::SaveCourseService,
};
use models::tree::CourseTree;
use tower_oauth2_resource_server::claims::DefaultClaims;
use uuid::Uuid;

/// Get paginated list of published courses
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseQueryParams),
    responses(
        (status = 200, description = "List of courses retrieved successfully", body = PaginatedCoursesResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn get_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseQueryParams>,
) -> Result<Json<PaginatedCoursesResponse>, ApiError> {
    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, 100);

    let (courses, total_items) = QueryCourseService::list_published(
        &state.db,
        page,
        per_page,
        params.categories(),
        params.search.clone(),
    )
    .await?;

    // Calculate pagination metadata
    let total_pages = total_items.div_ceil(per_page);
    let pagination = PaginationMeta {
        page,
        per_page,
        total_pages,
        total_items,
        has_next: page < total_pages,
        has_prev: page > 1,
    };

    Ok(Json(PaginatedCoursesResponse {
        courses: courses.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

/// Get the caller's own courses, drafts included
#[utoipa::path(
    get,
    path = "/api/courses/mine",
    responses(
        (status = 200, description = "Courses owned by the caller", body = Vec<CourseSummaryResponse>),
        (status = 401, description = "Unauthorized - invalid or missing JWT")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn get_my_courses(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
) -> Result<Json<Vec<CourseSummaryResponse>>, ApiError> {
    let caller = caller_id(&claims)?;

    let courses = QueryCourseService::list_owned(&state.db, caller).await?;

    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

/// Get a course with its modules and lessons
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course found", body = CoursePayload),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn get_course_by_id(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CoursePayload>, ApiError> {
    let caller = caller_id(&claims)?;

    QueryCourseService::get_course_tree(&state.db, caller, id)
        .await?
        .map(|tree| Json(tree.into()))
        .ok_or_else(|| ApiError::not_found("course"))
}

/// Save a whole course tree in one transaction
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    request_body = CoursePayload,
    responses(
        (status = 200, description = "Course saved", body = CoursePayload),
        (status = 400, description = "Invalid course tree"),
        (status = 403, description = "Caller does not own the course"),
        (status = 422, description = "Malformed payload"),
        (status = 500, description = "Internal server error; nothing was saved")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn save_course(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CoursePayload>,
) -> Result<Json<CoursePayload>, ApiError> {
    let caller = caller_id(&claims)?;
    if payload.id != id {
        return Err(ApiError::bad_request(format!(
            "course id {} does not match path {id}",
            payload.id
        )));
    }

    let tree = CourseTree::from(payload);
    SaveCourseService::save_course_tree(&state.db, caller, &tree).await?;

    QueryCourseService::get_course_tree(&state.db, caller, id)
        .await?
        .map(|tree| Json(tree.into()))
        .ok_or_else(|| ApiError::not_found("course"))
}

/// Delete a course with everything below it
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Caller does not own the course"),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let caller = caller_id(&claims)?;

    CourseService::delete_course(&state.db, caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Publish or unpublish a course
#[utoipa::path(
    put,
    path = "/api/courses/{id}/published",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Visibility updated", body = CourseSummaryResponse),
        (status = 403, description = "Caller does not own the course"),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn set_published(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<CourseSummaryResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let course = CourseService::set_published(&state.db, caller, id, request.is_published).await?;
    Ok(Json(course.into()))
}
