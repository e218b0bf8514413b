use crate::{
    entities::{courses, enrollments, lessons, modules, progress},
    error::ServiceError,
};
use chrono::Utc;
use log::info;
use models::policy::{Action, Resource, authorize};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

pub struct CourseService;

impl CourseService {
    /// Loads a course row the caller may perform `action` on.
    ///
    /// A course the caller cannot even read is reported as missing so that
    /// unpublished drafts stay invisible.
    pub async fn require_course<C: ConnectionTrait>(
        conn: &C,
        caller: Uuid,
        course_id: Uuid,
        action: Action,
    ) -> Result<courses::Model, ServiceError> {
        let course = courses::Entity::find_by_id(course_id)
            .one(conn)
            .await?
            .ok_or(ServiceError::NotFound("course"))?;

        let resource = Resource::Course {
            owner: course.teacher_id,
            published: course.is_published,
        };
        if authorize(Some(caller), resource, Action::Read).is_err() {
            return Err(ServiceError::NotFound("course"));
        }
        authorize(Some(caller), resource, action)?;

        Ok(course)
    }

    /// Resolves the course a lesson belongs to through its module
    pub async fn course_of_lesson<C: ConnectionTrait>(
        conn: &C,
        lesson_id: Uuid,
    ) -> Result<Option<courses::Model>, ServiceError> {
        let Some((_, module)) = lessons::Entity::find_by_id(lesson_id)
            .find_also_related(modules::Entity)
            .one(conn)
            .await?
        else {
            return Ok(None);
        };

        match module {
            Some(module) => Ok(courses::Entity::find_by_id(module.course_id)
                .one(conn)
                .await?),
            None => Ok(None),
        }
    }

    /// Checks that a module and lesson, where already saved, sit under the
    /// given course and module. Unsaved ids pass.
    pub async fn check_lesson_placement<C: ConnectionTrait>(
        conn: &C,
        course_id: Uuid,
        module_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<(), ServiceError> {
        if let Some(module) = modules::Entity::find_by_id(module_id).one(conn).await? {
            if module.course_id != course_id {
                return Err(ServiceError::Invalid(format!(
                    "module {module_id} does not belong to course {course_id}"
                )));
            }
        }

        if let Some(lesson) = lessons::Entity::find_by_id(lesson_id).one(conn).await? {
            if lesson.module_id != module_id {
                return Err(ServiceError::Invalid(format!(
                    "lesson {lesson_id} does not belong to module {module_id}"
                )));
            }
        }

        Ok(())
    }

    /// Publishes or unpublishes a course. Owner only.
    pub async fn set_published(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
        published: bool,
    ) -> Result<courses::Model, ServiceError> {
        let course = Self::require_course(db, caller, course_id, Action::Write).await?;

        let mut course = course.into_active_model();
        course.is_published = Set(published);
        course.updated_at = Set(Utc::now().naive_utc());
        let course = course.update(db).await?;

        info!("Course {course_id} published={published}");
        Ok(course)
    }

    /// Deletes a course with its modules, lessons, enrollments and progress.
    /// Owner only.
    pub async fn delete_course(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = db.begin().await?;

        Self::require_course(&txn, caller, course_id, Action::Write).await?;

        let module_ids: Vec<Uuid> = modules::Entity::find()
            .select_only()
            .column(modules::Column::Id)
            .filter(modules::Column::CourseId.eq(course_id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !module_ids.is_empty() {
            let lesson_ids: Vec<Uuid> = lessons::Entity::find()
                .select_only()
                .column(lessons::Column::Id)
                .filter(lessons::Column::ModuleId.is_in(module_ids.clone()))
                .into_tuple()
                .all(&txn)
                .await?;

            if !lesson_ids.is_empty() {
                progress::Entity::delete_many()
                    .filter(progress::Column::LessonId.is_in(lesson_ids))
                    .exec(&txn)
                    .await?;
            }
            lessons::Entity::delete_many()
                .filter(lessons::Column::ModuleId.is_in(module_ids))
                .exec(&txn)
                .await?;
        }

        modules::Entity::delete_many()
            .filter(modules::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await?;
        enrollments::Entity::delete_many()
            .filter(enrollments::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await?;
        courses::Entity::delete_by_id(course_id).exec(&txn).await?;

        txn.commit().await?;
        info!("Deleted course {course_id}");
        Ok(())
    }
}
