use crate::{
    entities::{courses, lessons, modules, progress},
    error::ServiceError,
};
use chrono::{NaiveDateTime, Utc};
use log::{debug, info, warn};
use models::{
    policy::{Action, Resource, authorize},
    reconcile::{self, PersistedTree, ReconcilePlan},
    tree::CourseTree,
};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

pub struct SaveCourseService;

impl SaveCourseService {
    /// Makes the stored rows of `tree.id` match `tree` in one transaction.
    ///
    /// The caller must own the course. Modules and lessons missing from the
    /// input are deleted, everything else is upserted by id. On any error the
    /// transaction is rolled back and the previously stored tree stays as it
    /// was. Nothing is returned: callers re-fetch the canonical tree.
    pub async fn save_course_tree(
        db: &DatabaseConnection,
        caller: Uuid,
        tree: &CourseTree,
    ) -> Result<(), ServiceError> {
        tree.validate()?;

        let txn = db.begin().await?;

        match Self::apply(&txn, caller, tree).await {
            Ok(plan) => {
                txn.commit().await?;
                info!(
                    "Saved course {} ({} modules, {} lessons, {} modules and {} lessons deleted)",
                    tree.id,
                    plan.module_writes.len(),
                    plan.lesson_writes.len(),
                    plan.module_deletes.len(),
                    plan.lesson_deletes.len()
                );
                Ok(())
            }
            Err(e) => {
                warn!("Rolling back save of course {}: {e}", tree.id);
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    async fn apply<C: ConnectionTrait>(
        txn: &C,
        caller: Uuid,
        tree: &CourseTree,
    ) -> Result<ReconcilePlan, ServiceError> {
        let persisted = Self::load_persisted(txn, tree.id).await?;

        // Ownership is checked before the first write
        authorize(
            Some(caller),
            Resource::Course {
                owner: tree.teacher_id,
                published: tree.is_published,
            },
            Action::Write,
        )?;
        if let Some(owner) = persisted.course_owner
            && owner != tree.teacher_id
        {
            return Err(ServiceError::Forbidden(format!(
                "course {} belongs to another teacher",
                tree.id
            )));
        }

        let plan = reconcile::plan(&persisted, tree);
        debug!("Reconcile plan for course {}: {plan:?}", tree.id);

        Self::reject_foreign_ids(txn, &plan).await?;

        let now = Utc::now().naive_utc();
        Self::upsert_course(txn, tree, now).await?;
        Self::upsert_modules(txn, tree, now).await?;
        Self::upsert_lessons(txn, tree, now).await?;

        // Lessons go first so no lesson is ever left pointing at a deleted module
        if !plan.lesson_deletes.is_empty() {
            progress::Entity::delete_many()
                .filter(progress::Column::LessonId.is_in(plan.lesson_deletes.clone()))
                .exec(txn)
                .await?;
            lessons::Entity::delete_many()
                .filter(lessons::Column::Id.is_in(plan.lesson_deletes.clone()))
                .exec(txn)
                .await?;
        }
        if !plan.module_deletes.is_empty() {
            modules::Entity::delete_many()
                .filter(modules::Column::Id.is_in(plan.module_deletes.clone()))
                .filter(modules::Column::CourseId.eq(tree.id))
                .exec(txn)
                .await?;
        }

        Ok(plan)
    }

    /// Reads the ids currently stored under a course
    pub(crate) async fn load_persisted<C: ConnectionTrait>(
        conn: &C,
        course_id: Uuid,
    ) -> Result<PersistedTree, ServiceError> {
        let Some(course) = courses::Entity::find_by_id(course_id).one(conn).await? else {
            return Ok(PersistedTree::default());
        };

        let module_ids: Vec<Uuid> = modules::Entity::find()
            .filter(modules::Column::CourseId.eq(course_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let lessons = if module_ids.is_empty() {
            vec![]
        } else {
            lessons::Entity::find()
                .filter(lessons::Column::ModuleId.is_in(module_ids.clone()))
                .all(conn)
                .await?
        };

        Ok(PersistedTree {
            course_owner: Some(course.teacher_id),
            modules: module_ids.into_iter().collect(),
            lessons: lessons.into_iter().map(|l| (l.id, l.module_id)).collect(),
        })
    }

    /// Ids the plan inserts must not already belong to another course
    async fn reject_foreign_ids<C: ConnectionTrait>(
        conn: &C,
        plan: &ReconcilePlan,
    ) -> Result<(), ServiceError> {
        let new_modules = plan.inserted_modules();
        if !new_modules.is_empty()
            && let Some(taken) = modules::Entity::find()
                .filter(modules::Column::Id.is_in(new_modules))
                .one(conn)
                .await?
        {
            return Err(ServiceError::Forbidden(format!(
                "module {} belongs to another course",
                taken.id
            )));
        }

        let new_lessons = plan.inserted_lessons();
        if !new_lessons.is_empty()
            && let Some(taken) = lessons::Entity::find()
                .filter(lessons::Column::Id.is_in(new_lessons))
                .one(conn)
                .await?
        {
            return Err(ServiceError::Forbidden(format!(
                "lesson {} belongs to another course",
                taken.id
            )));
        }

        Ok(())
    }

    async fn upsert_course<C: ConnectionTrait>(
        conn: &C,
        tree: &CourseTree,
        now: NaiveDateTime,
    ) -> Result<(), ServiceError> {
        let course = courses::ActiveModel {
            id: Set(tree.id),
            teacher_id: Set(tree.teacher_id),
            title: Set(tree.title.clone()),
            description: Set(tree.description.clone()),
            category: Set(tree.category.clone()),
            image_url: Set(tree.image_url.clone()),
            is_published: Set(tree.is_published),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // Owner and creation time are never overwritten
        courses::Entity::insert(course)
            .on_conflict(
                OnConflict::column(courses::Column::Id)
                    .update_columns([
                        courses::Column::Title,
                        courses::Column::Description,
                        courses::Column::Category,
                        courses::Column::ImageUrl,
                        courses::Column::IsPublished,
                        courses::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(())
    }

    async fn upsert_modules<C: ConnectionTrait>(
        conn: &C,
        tree: &CourseTree,
        now: NaiveDateTime,
    ) -> Result<(), ServiceError> {
        let all_modules: Vec<modules::ActiveModel> = tree
            .modules
            .iter()
            .map(|module| modules::ActiveModel {
                id: Set(module.id),
                course_id: Set(tree.id),
                title: Set(module.title.clone()),
                position: Set(module.order),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        if !all_modules.is_empty() {
            modules::Entity::insert_many(all_modules)
                .on_conflict(
                    OnConflict::column(modules::Column::Id)
                        .update_columns([
                            modules::Column::Title,
                            modules::Column::Position,
                            modules::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(conn)
                .await?;
        }

        Ok(())
    }

    async fn upsert_lessons<C: ConnectionTrait>(
        conn: &C,
        tree: &CourseTree,
        now: NaiveDateTime,
    ) -> Result<(), ServiceError> {
        let mut all_lessons = Vec::with_capacity(tree.lesson_count());

        for module in &tree.modules {
            for lesson in &module.lessons {
                // Absent content is written as explicit NULLs so that a
                // previously attached file is cleared
                let content = lesson.content.as_ref();
                let content_size = content
                    .map(|c| {
                        i64::try_from(c.size).map_err(|_| {
                            ServiceError::Invalid(format!(
                                "content size of lesson {} is out of range",
                                lesson.id
                            ))
                        })
                    })
                    .transpose()?;

                all_lessons.push(lessons::ActiveModel {
                    id: Set(lesson.id),
                    module_id: Set(module.id),
                    title: Set(lesson.title.clone()),
                    position: Set(lesson.order),
                    content_name: Set(content.map(|c| c.name.clone())),
                    content_kind: Set(content.map(|c| c.kind)),
                    content_url: Set(content.map(|c| c.url.clone())),
                    content_size: Set(content_size),
                    created_at: Set(now),
                    updated_at: Set(now),
                });
            }
        }

        if !all_lessons.is_empty() {
            lessons::Entity::insert_many(all_lessons)
                .on_conflict(
                    OnConflict::column(lessons::Column::Id)
                        .update_columns([
                            lessons::Column::ModuleId,
                            lessons::Column::Title,
                            lessons::Column::Position,
                            lessons::Column::ContentName,
                            lessons::Column::ContentKind,
                            lessons::Column::ContentUrl,
                            lessons::Column::ContentSize,
                            lessons::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(conn)
                .await?;
        }

        Ok(())
    }
}
