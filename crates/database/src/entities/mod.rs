pub mod course;
pub mod course_module;
pub mod enrollment;
pub mod lesson;
pub mod profile;
pub mod progress;

pub use course as courses;
pub use course_module as modules;
pub use enrollment as enrollments;
pub use lesson as lessons;
pub use profile as profiles;
