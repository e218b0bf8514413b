use crate::dtos::course::ContentPayload;
use serde::Serialize;
use storage::UploadedObject;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart form for a course cover image
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CourseImageForm {
    pub course_id: Uuid,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Multipart form for a lesson's video or document
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct LessonFileForm {
    pub course_id: Uuid,
    pub module_id: Uuid,
    pub lesson_id: Uuid,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub bucket: String,
    pub key: String,
    pub url: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    /// Ready to be attached to the lesson; absent for course images
    pub content: Option<ContentPayload>,
}

impl From<UploadedObject> for UploadResponse {
    fn from(object: UploadedObject) -> Self {
        UploadResponse {
            content: object.to_content().map(ContentPayload::from),
            bucket: object.bucket.to_string(),
            key: object.key,
            url: object.url,
            name: object.name,
            content_type: object.content_type,
            size: object.size,
        }
    }
}
