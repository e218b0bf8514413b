use crate::{
    entities::{courses, lessons, modules},
    error::ServiceError,
    services::course::CourseService,
};
use models::{
    policy::Action,
    tree::{Content, CourseTree, Lesson, Module},
};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::collections::HashMap;
use uuid::Uuid;

pub struct QueryCourseService;

impl QueryCourseService {
    /// Get a course with all of its modules and lessons, in display order.
    ///
    /// Returns `None` if the course does not exist or the caller may not
    /// read it.
    pub async fn get_course_tree(
        db: &DatabaseConnection,
        caller: Uuid,
        course_id: Uuid,
    ) -> Result<Option<CourseTree>, ServiceError> {
        let course = match CourseService::require_course(db, caller, course_id, Action::Read).await
        {
            Ok(course) => course,
            Err(ServiceError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(Self::load_tree(db, course).await?))
    }

    /// Assembles the tree below an already authorized course row
    pub async fn load_tree<C: ConnectionTrait>(
        conn: &C,
        course: courses::Model,
    ) -> Result<CourseTree, DbErr> {
        let module_rows = modules::Entity::find()
            .filter(modules::Column::CourseId.eq(course.id))
            .order_by_asc(modules::Column::Position)
            .all(conn)
            .await?;

        let module_ids: Vec<Uuid> = module_rows.iter().map(|m| m.id).collect();
        let lesson_rows = if module_ids.is_empty() {
            vec![]
        } else {
            lessons::Entity::find()
                .filter(lessons::Column::ModuleId.is_in(module_ids))
                .order_by_asc(lessons::Column::Position)
                .all(conn)
                .await?
        };

        // Build lookup map
        let mut lessons_by_module: HashMap<Uuid, Vec<Lesson>> = HashMap::new();
        for row in lesson_rows {
            lessons_by_module
                .entry(row.module_id)
                .or_default()
                .push(lesson_from_row(row));
        }

        let modules = module_rows
            .into_iter()
            .map(|row| Module {
                lessons: lessons_by_module.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                order: row.position,
            })
            .collect();

        Ok(CourseTree {
            id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            image_url: course.image_url,
            is_published: course.is_published,
            teacher_id: course.teacher_id,
            modules,
        })
    }

    /// Query published courses with pagination and filtering
    pub async fn list_published(
        db: &DatabaseConnection,
        page: u64,
        per_page: u64,
        categories: Option<Vec<String>>,
        search: Option<String>,
    ) -> Result<(Vec<courses::Model>, u64), DbErr> {
        let mut condition = Condition::all().add(courses::Column::IsPublished.eq(true));

        if let Some(categories) = categories
            && !categories.is_empty()
        {
            condition = condition.add(courses::Column::Category.is_in(categories));
        }

        if let Some(search) = search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            let search_condition = Condition::any()
                .add(courses::Column::Title.like(format!("%{search}%")))
                .add(courses::Column::Description.like(format!("%{search}%")));
            condition = condition.add(search_condition);
        }

        let query = courses::Entity::find()
            .filter(condition)
            .order_by_desc(courses::Column::UpdatedAt)
            .order_by_asc(courses::Column::Id);

        // Apply pagination
        let total_items = query.clone().count(db).await?;
        let paginator = query.paginate(db, per_page.max(1));
        let courses = paginator.fetch_page(page.saturating_sub(1)).await?; // SeaORM uses 0-based pages

        Ok((courses, total_items))
    }

    /// All courses owned by the caller, drafts included
    pub async fn list_owned(
        db: &DatabaseConnection,
        caller: Uuid,
    ) -> Result<Vec<courses::Model>, DbErr> {
        courses::Entity::find()
            .filter(courses::Column::TeacherId.eq(caller))
            .order_by_desc(courses::Column::UpdatedAt)
            .all(db)
            .await
    }
}

fn lesson_from_row(row: lessons::Model) -> Lesson {
    // A lesson only carries content when every content column is present
    let content = match (
        row.content_name,
        row.content_kind,
        row.content_url,
        row.content_size,
    ) {
        (Some(name), Some(kind), Some(url), Some(size)) => Some(Content {
            name,
            kind,
            url,
            size: u64::try_from(size).unwrap_or_default(),
        }),
        _ => None,
    };

    Lesson {
        id: row.id,
        title: row.title,
        order: row.position,
        content,
    }
}
