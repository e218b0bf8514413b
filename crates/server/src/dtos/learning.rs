use crate::dtos::course::CourseSummaryResponse;
use chrono::NaiveDateTime;
use database::{
    entities::{courses, enrollments, progress},
    services::progress::CourseProgressSummary,
};
use models::progress::CompletionEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: NaiveDateTime,
    pub course: Option<CourseSummaryResponse>,
}

impl EnrollmentResponse {
    pub fn new(enrollment: enrollments::Model, course: Option<courses::Model>) -> Self {
        EnrollmentResponse {
            id: enrollment.id,
            course_id: enrollment.course_id,
            enrolled_at: enrollment.created_at,
            course: course.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkProgressRequest {
    pub completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub lesson_id: Uuid,
    pub completed: bool,
    pub updated_at: NaiveDateTime,
}

impl From<progress::Model> for ProgressResponse {
    fn from(row: progress::Model) -> Self {
        ProgressResponse {
            lesson_id: row.lesson_id,
            completed: row.completed,
            updated_at: row.updated_at,
        }
    }
}

/// Something the player reports about a lesson
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompletionEventRequest {
    VideoProgress {
        position_secs: f64,
        duration_secs: f64,
    },
    DocumentOpened,
}

impl From<CompletionEventRequest> for CompletionEvent {
    fn from(event: CompletionEventRequest) -> Self {
        match event {
            CompletionEventRequest::VideoProgress {
                position_secs,
                duration_secs,
            } => CompletionEvent::VideoProgress {
                position_secs,
                duration_secs,
            },
            CompletionEventRequest::DocumentOpened => CompletionEvent::DocumentOpened,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    /// Whether the lesson is complete after this event
    pub completed: bool,
    pub progress: Option<ProgressResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseProgressResponse {
    pub course_id: Uuid,
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub percent: u8,
    pub completed_lesson_ids: Vec<Uuid>,
}

impl CourseProgressResponse {
    pub fn new(course_id: Uuid, summary: CourseProgressSummary) -> Self {
        CourseProgressResponse {
            course_id,
            total_lessons: summary.progress.total_lessons,
            completed_lessons: summary.progress.completed_lessons,
            percent: summary.progress.percent,
            completed_lesson_ids: summary.completed_lesson_ids,
        }
    }
}
