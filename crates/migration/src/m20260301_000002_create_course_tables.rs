use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create courses table
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Courses::TeacherId).uuid().not_null())
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(
                        ColumnDef::new(Courses::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Courses::Category)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Courses::ImageUrl).text())
                    .col(
                        ColumnDef::new(Courses::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Courses::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create modules table
        manager
            .create_table(
                Table::create()
                    .table(Modules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Modules::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Modules::CourseId).uuid().not_null())
                    .col(ColumnDef::new(Modules::Title).string().not_null())
                    .col(ColumnDef::new(Modules::Position).integer().not_null())
                    .col(
                        ColumnDef::new(Modules::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Modules::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-modules-course_id")
                            .from(Modules::Table, Modules::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create lessons table. The content columns are all NULL for a
        // placeholder lesson.
        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lessons::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Lessons::ModuleId).uuid().not_null())
                    .col(ColumnDef::new(Lessons::Title).string().not_null())
                    .col(ColumnDef::new(Lessons::Position).integer().not_null())
                    .col(ColumnDef::new(Lessons::ContentName).text())
                    .col(ColumnDef::new(Lessons::ContentKind).string())
                    .col(ColumnDef::new(Lessons::ContentUrl).text())
                    .col(ColumnDef::new(Lessons::ContentSize).big_integer())
                    .col(
                        ColumnDef::new(Lessons::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Lessons::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-lessons-module_id")
                            .from(Lessons::Table, Lessons::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to respect foreign key constraints
        manager
            .drop_table(Table::drop().table(Lessons::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Modules::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Courses {
    Table,
    Id,
    TeacherId,
    Title,
    Description,
    Category,
    ImageUrl,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Modules {
    Table,
    Id,
    CourseId,
    Title,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Lessons {
    Table,
    Id,
    ModuleId,
    Title,
    Position,
    ContentName,
    ContentKind,
    ContentUrl,
    ContentSize,
    CreatedAt,
    UpdatedAt,
}
