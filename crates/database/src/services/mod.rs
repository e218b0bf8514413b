pub mod course;
pub mod enrollment;
pub mod profile;
pub mod progress;
pub mod query_course;
pub mod save_course;
