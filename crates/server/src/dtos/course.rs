use chrono::NaiveDateTime;
use database::entities::courses;
use models::{
    media::MediaKind,
    tree::{Content, CourseTree, Lesson, Module},
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// A whole course as edited by its teacher.
///
/// Every field is required since a save overwrites the stored course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CoursePayload {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Must be present; `null` removes the cover image
    #[serde(deserialize_with = "required_nullable")]
    pub image_url: Option<String>,
    pub is_published: bool,
    pub teacher_id: Uuid,
    pub modules: Vec<ModulePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModulePayload {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    pub lessons: Vec<LessonPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LessonPayload {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    /// Must be present; `null` removes the lesson's file
    #[serde(deserialize_with = "required_nullable")]
    pub content: Option<ContentPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContentPayload {
    pub name: String,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "video/mp4")]
    pub kind: MediaKind,
    pub url: String,
    pub size: u64,
}

/// Distinguishes an explicit `null` from a missing field
fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

impl From<CoursePayload> for CourseTree {
    fn from(payload: CoursePayload) -> Self {
        CourseTree {
            id: payload.id,
            title: payload.title,
            description: payload.description,
            category: payload.category,
            image_url: payload.image_url,
            is_published: payload.is_published,
            teacher_id: payload.teacher_id,
            modules: payload
                .modules
                .into_iter()
                .map(|module| Module {
                    id: module.id,
                    title: module.title,
                    order: module.order,
                    lessons: module
                        .lessons
                        .into_iter()
                        .map(|lesson| Lesson {
                            id: lesson.id,
                            title: lesson.title,
                            order: lesson.order,
                            content: lesson.content.map(Content::from),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<CourseTree> for CoursePayload {
    fn from(tree: CourseTree) -> Self {
        CoursePayload {
            id: tree.id,
            title: tree.title,
            description: tree.description,
            category: tree.category,
            image_url: tree.image_url,
            is_published: tree.is_published,
            teacher_id: tree.teacher_id,
            modules: tree
                .modules
                .into_iter()
                .map(|module| ModulePayload {
                    id: module.id,
                    title: module.title,
                    order: module.order,
                    lessons: module
                        .lessons
                        .into_iter()
                        .map(|lesson| LessonPayload {
                            id: lesson.id,
                            title: lesson.title,
                            order: lesson.order,
                            content: lesson.content.map(ContentPayload::from),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<ContentPayload> for Content {
    fn from(c: ContentPayload) -> Self {
        Content {
            name: c.name,
            kind: c.kind,
            url: c.url,
            size: c.size,
        }
    }
}

impl From<Content> for ContentPayload {
    fn from(c: Content) -> Self {
        ContentPayload {
            name: c.name,
            kind: c.kind,
            url: c.url,
            size: c.size,
        }
    }
}

/// A course without its modules, as listed in catalogs
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub teacher_id: Uuid,
    pub updated_at: NaiveDateTime,
}

impl From<courses::Model> for CourseSummaryResponse {
    fn from(course: courses::Model) -> Self {
        CourseSummaryResponse {
            id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            image_url: course.image_url,
            is_published: course.is_published,
            teacher_id: course.teacher_id,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub courses: Vec<CourseSummaryResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CourseQueryParams {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u64,

    /// Comma separated list of categories
    pub category: Option<String>,
    pub search: Option<String>,
}

impl CourseQueryParams {
    pub fn categories(&self) -> Option<Vec<String>> {
        self.category.as_ref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect()
        })
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub is_published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(content: Option<serde_json::Value>) -> serde_json::Value {
        let mut lesson = json!({
            "id": Uuid::new_v4(),
            "title": "Intro",
            "order": 0,
        });
        if let Some(content) = content {
            lesson["content"] = content;
        }

        json!({
            "id": Uuid::new_v4(),
            "title": "Course",
            "description": "",
            "category": "",
            "image_url": null,
            "is_published": false,
            "teacher_id": Uuid::new_v4(),
            "modules": [{
                "id": Uuid::new_v4(),
                "title": "Module",
                "order": 0,
                "lessons": [lesson],
            }],
        })
    }

    #[test]
    fn test_content_must_be_present() {
        let missing = serde_json::from_value::<CoursePayload>(payload(None));
        assert!(missing.is_err());

        let null = serde_json::from_value::<CoursePayload>(payload(Some(json!(null)))).unwrap();
        assert_eq!(null.modules[0].lessons[0].content, None);
    }

    #[test]
    fn test_course_fields_must_be_present() {
        for field in ["image_url", "description", "category", "is_published"] {
            let mut json = payload(Some(json!(null)));
            json.as_object_mut().unwrap().remove(field);
            assert!(
                serde_json::from_value::<CoursePayload>(json).is_err(),
                "{field} should be required"
            );
        }

        let mut json = payload(Some(json!(null)));
        json["image_url"] = json!("https://storage.example/course-images/cover.png");
        let parsed = serde_json::from_value::<CoursePayload>(json).unwrap();
        assert_eq!(
            parsed.image_url.as_deref(),
            Some("https://storage.example/course-images/cover.png")
        );

        let cleared = serde_json::from_value::<CoursePayload>(payload(Some(json!(null)))).unwrap();
        assert_eq!(cleared.image_url, None);
    }

    #[test]
    fn test_content_wire_tokens() {
        let parsed = serde_json::from_value::<CoursePayload>(payload(Some(json!({
            "name": "intro.pdf",
            "type": "application/pdf",
            "url": "https://storage.example/intro.pdf",
            "size": 2048,
        }))))
        .unwrap();

        let tree = CourseTree::from(parsed.clone());
        let content = tree.modules[0].lessons[0].content.as_ref().unwrap();
        assert_eq!(content.kind, MediaKind::Document);

        let back = CoursePayload::from(tree);
        assert_eq!(back, parsed);
        let json = serde_json::to_value(&back).unwrap();
        assert_eq!(
            json["modules"][0]["lessons"][0]["content"]["type"],
            "application/pdf"
        );
    }

    #[test]
    fn test_category_list() {
        let params = CourseQueryParams {
            page: 1,
            per_page: 20,
            category: Some("art, music,,".into()),
            search: None,
        };
        assert_eq!(
            params.categories(),
            Some(vec!["art".to_string(), "music".to_string()])
        );
    }
}
