use crate::{
    dtos::upload::{CourseImageForm, LessonFileForm, UploadResponse},
    error::ApiError,
    routes::auth::caller_id,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use bytes::Bytes;
use database::{error::ServiceError, services::course::CourseService};
use log::debug;
use models::policy::Action;
use std::{collections::HashMap, str::FromStr};
use storage::{Bucket, ProgressTracker, UploadError, UploadRequest, UploadTarget};
use tower_oauth2_resource_server::claims::DefaultClaims;
use uuid::Uuid;

/// Largest request body accepted on the upload routes
pub const UPLOAD_BODY_LIMIT: usize = 513 * 1024 * 1024;

struct UploadForm {
    fields: HashMap<String, String>,
    file_name: String,
    content_type: String,
    body: Bytes,
}

impl UploadForm {
    /// Reads the form. The file's type is checked against `bucket` before
    /// its body is read.
    async fn read(mut multipart: Multipart, bucket: Bucket) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !bucket.accepts(&content_type) {
                    return Err(UploadError::UnsupportedType {
                        bucket,
                        content_type,
                    }
                    .into());
                }
                let body = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, content_type, body));
            } else {
                fields.insert(name, field.text().await.map_err(bad_multipart)?);
            }
        }

        let (file_name, content_type, body) =
            file.ok_or_else(|| ApiError::bad_request("file is required"))?;

        Ok(Self {
            fields,
            file_name,
            content_type,
            body,
        })
    }

    fn uuid(&self, name: &str) -> Result<Uuid, ApiError> {
        let value = self
            .fields
            .get(name)
            .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))?;

        Uuid::parse_str(value.trim())
            .map_err(|_| ApiError::bad_request(format!("{name} is not a valid identifier")))
    }

    /// Size announced by the client, or the size received
    fn declared_size(&self) -> Result<u64, ApiError> {
        match self.fields.get("size") {
            Some(size) => size
                .trim()
                .parse()
                .map_err(|_| ApiError::bad_request("size is not a number")),
            None => Ok(self.body.len() as u64),
        }
    }
}

fn bad_multipart(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

/// Courses that do not exist yet may receive files; existing ones only from
/// their owner
async fn require_course_owner(
    state: &AppState,
    caller: Uuid,
    course: Uuid,
) -> Result<(), ApiError> {
    match CourseService::require_course(&state.db, caller, course, Action::Write).await {
        Ok(_) | Err(ServiceError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn store(
    state: &AppState,
    caller: Uuid,
    target: UploadTarget,
    form: UploadForm,
) -> Result<Json<UploadResponse>, ApiError> {
    require_course_owner(state, caller, target.course()).await?;
    if let UploadTarget::LessonFile {
        course,
        module,
        lesson,
    } = target
    {
        CourseService::check_lesson_placement(&state.db, course, module, lesson).await?;
    }

    let request = UploadRequest {
        owner: caller,
        target,
        size: form.declared_size()?,
        file_name: form.file_name,
        content_type: form.content_type,
    };

    let tracker = ProgressTracker::new();
    let mut progress = tracker.subscribe();
    let file_name = request.file_name.clone();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let current = *progress.borrow_and_update();
            debug!("Upload of {file_name}: {}%", current.percent());
            if current.is_terminal() {
                break;
            }
        }
    });

    let uploaded = state.uploader.upload(&request, form.body, &tracker).await?;
    Ok(Json(uploaded.into()))
}

/// Upload a course cover image
#[utoipa::path(
    post,
    path = "/api/uploads/course-image",
    request_body(content = CourseImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Caller does not own the course"),
        (status = 413, description = "Image is too large"),
        (status = 415, description = "Not an accepted image type"),
        (status = 503, description = "Storage unavailable, retry")
    ),
    security(("jwt" = [])),
    tag = "Uploads"
)]
pub async fn upload_course_image(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let caller = caller_id(&claims)?;
    let form = UploadForm::read(multipart, Bucket::CourseImages).await?;

    let target = UploadTarget::CourseImage {
        course: form.uuid("course_id")?,
    };
    store(&state, caller, target, form).await
}

/// Upload a video or document for a lesson
#[utoipa::path(
    post,
    path = "/api/uploads/lesson-file",
    request_body(content = LessonFileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored; `content` can be attached to the lesson", body = UploadResponse),
        (status = 400, description = "Missing or malformed fields, or the lesson is not in that module"),
        (status = 403, description = "Caller does not own the course"),
        (status = 413, description = "File is too large"),
        (status = 415, description = "Not a video or PDF"),
        (status = 503, description = "Storage unavailable, retry")
    ),
    security(("jwt" = [])),
    tag = "Uploads"
)]
pub async fn upload_lesson_file(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let caller = caller_id(&claims)?;
    let form = UploadForm::read(multipart, Bucket::LessonFiles).await?;

    let target = UploadTarget::LessonFile {
        course: form.uuid("course_id")?,
        module: form.uuid("module_id")?,
        lesson: form.uuid("lesson_id")?,
    };
    store(&state, caller, target, form).await
}

/// Delete an uploaded object
#[utoipa::path(
    delete,
    path = "/api/uploads/{bucket}/{key}",
    params(
        ("bucket" = String, Path, description = "course-images or lesson-files"),
        ("key" = String, Path, description = "Object key")
    ),
    responses(
        (status = 204, description = "Object deleted"),
        (status = 403, description = "Object belongs to someone else"),
        (status = 404, description = "Object not found")
    ),
    security(("jwt" = [])),
    tag = "Uploads"
)]
pub async fn delete_upload(
    State(state): State<AppState>,
    Extension(claims): Extension<DefaultClaims>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let caller = caller_id(&claims)?;
    let bucket = Bucket::from_str(&bucket)
        .map_err(|_| ApiError::bad_request(format!("unknown bucket {bucket}")))?;

    state.uploader.remove(caller, bucket, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
