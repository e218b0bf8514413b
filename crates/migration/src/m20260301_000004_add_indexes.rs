use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dashboard lookups of a teacher's own courses
        manager
            .create_index(
                Index::create()
                    .name("idx_courses_teacher_id")
                    .table(Courses::Table)
                    .col(Courses::TeacherId)
                    .to_owned(),
            )
            .await?;

        // Catalog listing filters on published + category
        manager
            .create_index(
                Index::create()
                    .name("idx_courses_published_category")
                    .table(Courses::Table)
                    .col(Courses::IsPublished)
                    .col(Courses::Category)
                    .to_owned(),
            )
            .await?;

        // Tree loads and reconciliation deletes go by parent id
        manager
            .create_index(
                Index::create()
                    .name("idx_modules_course_id")
                    .table(Modules::Table)
                    .col(Modules::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lessons_module_id")
                    .table(Lessons::Table)
                    .col(Lessons::ModuleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_course_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_progress_lesson_id")
                    .table(Progress::Table)
                    .col(Progress::LessonId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_progress_lesson_id",
            "idx_enrollments_course_id",
            "idx_lessons_module_id",
            "idx_modules_course_id",
            "idx_courses_published_category",
            "idx_courses_teacher_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
enum Courses {
    Table,
    TeacherId,
    IsPublished,
    Category,
}

#[derive(Iden)]
enum Modules {
    Table,
    CourseId,
}

#[derive(Iden)]
enum Lessons {
    Table,
    ModuleId,
}

#[derive(Iden)]
enum Enrollments {
    Table,
    CourseId,
}

#[derive(Iden)]
enum Progress {
    Table,
    LessonId,
}
