//! Shared helpers for the database integration tests

#![allow(dead_code)]

use database::entities::{courses, lessons, modules, progress};
use migration::{Migrator, MigratorTrait};
use models::{
    media::MediaKind,
    tree::{Content, CourseTree},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

/// Opens a fresh in-memory SQLite database with all migrations applied
pub async fn setup_db() -> DatabaseConnection {
    // A single connection, otherwise every pooled connection gets its own
    // in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn content(name: &str, kind: MediaKind) -> Content {
    Content {
        name: name.to_string(),
        kind,
        url: format!("https://storage.example/lesson-files/{name}"),
        size: 4096,
    }
}

/// A course with two modules: M1 has a video and a placeholder lesson, M2
/// has a single document lesson
pub fn sample_course(teacher: Uuid) -> CourseTree {
    let mut tree = CourseTree::new(teacher, "Intro to Systems");
    tree.set_details("Processes, memory and files", "computer-science");

    let m1 = tree.add_module("Processes");
    let l1 = tree.add_lesson(m1, "What is a process").unwrap();
    tree.add_lesson(m1, "Scheduling").unwrap();
    tree.attach_content(l1, content("process.mp4", MediaKind::Video))
        .unwrap();

    let m2 = tree.add_module("Memory");
    let l3 = tree.add_lesson(m2, "Virtual memory").unwrap();
    tree.attach_content(l3, content("vm.pdf", MediaKind::Document))
        .unwrap();

    tree
}

pub struct RowCounts {
    pub courses: u64,
    pub modules: u64,
    pub lessons: u64,
    pub progress: u64,
}

pub async fn row_counts(db: &DatabaseConnection) -> RowCounts {
    RowCounts {
        courses: courses::Entity::find().count(db).await.unwrap(),
        modules: modules::Entity::find().count(db).await.unwrap(),
        lessons: lessons::Entity::find().count(db).await.unwrap(),
        progress: progress::Entity::find().count(db).await.unwrap(),
    }
}
