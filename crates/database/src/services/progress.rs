use crate::{
    entities::{lessons, modules, progress},
    error::ServiceError,
    services::course::CourseService,
};
use chrono::Utc;
use log::debug;
use models::{
    policy::{Action, Resource, authorize},
    progress::{CompletionEvent, CourseProgress},
};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait, sea_query::OnConflict,
};
use serde::Serialize;
use uuid::Uuid;

/// Completion of one student across a course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgressSummary {
    #[serde(flatten)]
    pub progress: CourseProgress,
    pub completed_lesson_ids: Vec<Uuid>,
}

pub struct ProgressService;

impl ProgressService {
    /// Records the caller's completion state for a lesson.
    ///
    /// Keyed by (student, lesson): repeating the same call leaves exactly one
    /// row with the same state.
    pub async fn mark_lesson(
        db: &DatabaseConnection,
        caller: Uuid,
        lesson_id: Uuid,
        completed: bool,
    ) -> Result<progress::Model, ServiceError> {
        Self::require_readable_lesson(db, caller, lesson_id).await?;
        authorize(
            Some(caller),
            Resource::Progress { student: caller },
            Action::Write,
        )?;

        let row = progress::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(caller),
            lesson_id: Set(lesson_id),
            completed: Set(completed),
            updated_at: Set(Utc::now().naive_utc()),
        };

        progress::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([progress::Column::StudentId, progress::Column::LessonId])
                    .update_columns([progress::Column::Completed, progress::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        debug!("Progress of {caller} on lesson {lesson_id}: completed={completed}");

        progress::Entity::find()
            .filter(progress::Column::StudentId.eq(caller))
            .filter(progress::Column::LessonId.eq(lesson_id))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("progress"))
    }

    /// Applies a player event; returns the stored row when it completed the lesson
    pub async fn record_event(
        db: &DatabaseConnection,
        caller: Uuid,
        lesson_id: Uuid,
        event: CompletionEvent,
    ) -> Result<Option<progress::Model>, ServiceError> {
        if !event.completes() {
            Self::require_readable_lesson(db, caller, lesson_id).await?;
            return Ok(None);
        }

        Self::mark_lesson(db, caller, lesson_id, true)
            .await
            .map(Some)
    }

    /// Summarizes the caller's completed lessons in a course
    pub async fn course_progress(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
    ) -> Result<CourseProgressSummary, ServiceError> {
        CourseService::require_course(db, caller, course_id, Action::Read).await?;

        let total_lessons = lessons::Entity::find()
            .join(JoinType::InnerJoin, lessons::Relation::Module.def())
            .filter(modules::Column::CourseId.eq(course_id))
            .count(db)
            .await?;

        let completed_lesson_ids: Vec<Uuid> = progress::Entity::find()
            .select_only()
            .column(progress::Column::LessonId)
            .join(JoinType::InnerJoin, progress::Relation::Lesson.def())
            .join(JoinType::InnerJoin, lessons::Relation::Module.def())
            .filter(modules::Column::CourseId.eq(course_id))
            .filter(progress::Column::StudentId.eq(caller))
            .filter(progress::Column::Completed.eq(true))
            .into_tuple()
            .all(db)
            .await?;

        Ok(CourseProgressSummary {
            progress: CourseProgress::new(total_lessons, completed_lesson_ids.len() as u64),
            completed_lesson_ids,
        })
    }

    async fn require_readable_lesson(
        db: &DatabaseConnection,
        caller: Uuid,
        lesson_id: Uuid,
    ) -> Result<(), ServiceError> {
        let course = CourseService::course_of_lesson(db, lesson_id)
            .await?
            .ok_or(ServiceError::NotFound("lesson"))?;

        match CourseService::require_course(db, caller, course.id, Action::Read).await {
            Err(ServiceError::NotFound(_)) => Err(ServiceError::NotFound("lesson")),
            other => other.map(|_| ()),
        }
    }
}
