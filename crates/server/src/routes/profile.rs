use crate::{
    dtos::profile::{ProfileResponse, ProfileUpdateRequest},
    error::ApiError,
    routes::auth::caller_id,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use database::services::profile::ProfileService;
use tower_oauth2_resource_server::claims::DefaultClaims;
use uuid::Uuid;

/// Get a profile by subject ID
#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    params(
        ("id" = Uuid, Path, description = "Subject ID")
    ),
    responses(
        (status = 200, description = "Profile found", body = ProfileResponse),
        (status = 404, description = "Profile not found")
    ),
    security(("jwt" = [])),
    tag = "Profiles"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let profile = ProfileService::get(&state.db, caller, id).await?;
    Ok(Json(profile.into()))
}

/// Get the caller's own profile
#[utoipa::path(
    get,
    path = "/api/profiles/me",
    responses(
        (status = 200, description = "Profile found", body = ProfileResponse),
        (status = 404, description = "Caller has no profile yet")
    ),
    security(("jwt" = [])),
    tag = "Profiles"
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let profile = ProfileService::get(&state.db, caller, caller).await?;
    Ok(Json(profile.into()))
}

/// Create or update the caller's own profile
#[utoipa::path(
    put,
    path = "/api/profiles/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile stored", body = ProfileResponse),
        (status = 400, description = "Display name is empty")
    ),
    security(("jwt" = [])),
    tag = "Profiles"
)]
pub async fn put_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let caller = caller_id(&claims)?;

    let profile = ProfileService::upsert_own(&state.db, caller, request.into()).await?;
    Ok(Json(profile.into()))
}
