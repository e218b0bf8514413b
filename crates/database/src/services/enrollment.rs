use crate::{
    entities::{courses, enrollments},
    error::ServiceError,
    services::course::CourseService,
};
use chrono::Utc;
use log::info;
use models::policy::{Action, Resource, authorize};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};
use uuid::Uuid;

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls the caller in a course they can read.
    ///
    /// Enrolling twice is not an error and keeps the original row.
    pub async fn enroll(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
    ) -> Result<enrollments::Model, ServiceError> {
        CourseService::require_course(db, caller, course_id, Action::Read).await?;
        authorize(
            Some(caller),
            Resource::Enrollment { student: caller },
            Action::Write,
        )?;

        let enrollment = enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(caller),
            course_id: Set(course_id),
            created_at: Set(Utc::now().naive_utc()),
        };

        let inserted = enrollments::Entity::insert(enrollment)
            .on_conflict(
                OnConflict::columns([
                    enrollments::Column::StudentId,
                    enrollments::Column::CourseId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        if inserted > 0 {
            info!("Student {caller} enrolled in course {course_id}");
        }

        Self::find(db, caller, course_id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment"))
    }

    /// Removes the caller's enrollment. Returns whether one existed.
    pub async fn unenroll(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let result = enrollments::Entity::delete_many()
            .filter(enrollments::Column::StudentId.eq(caller))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn is_enrolled(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
    ) -> Result<bool, ServiceError> {
        Ok(Self::find(db, caller, course_id).await?.is_some())
    }

    /// The caller's enrollments with their courses, newest first.
    ///
    /// Courses that were unpublished after enrolling are left out unless the
    /// caller owns them.
    pub async fn list_for_student(
        db: &DatabaseConnection,
        caller: Uuid,
    ) -> Result<Vec<(enrollments::Model, courses::Model)>, ServiceError> {
        let rows = enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(caller))
            .order_by_desc(enrollments::Column::CreatedAt)
            .find_also_related(courses::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(enrollment, course)| course.map(|c| (enrollment, c)))
            .filter(|(enrollment, course)| {
                authorize(
                    Some(caller),
                    Resource::Enrollment {
                        student: enrollment.student_id,
                    },
                    Action::Read,
                )
                .is_ok()
                    && authorize(
                        Some(caller),
                        Resource::Course {
                            owner: course.teacher_id,
                            published: course.is_published,
                        },
                        Action::Read,
                    )
                    .is_ok()
            })
            .collect())
    }

    async fn find(
        db: &DatabaseConnection,
        student: Uuid,
        course_id: Uuid,
    ) -> Result<Option<enrollments::Model>, ServiceError> {
        Ok(enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(student))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .one(db)
            .await?)
    }
}
