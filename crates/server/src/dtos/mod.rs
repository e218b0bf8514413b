pub mod course;
pub mod learning;
pub mod profile;
pub mod upload;
