use crate::routes::{course, health, learning, profile, upload};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health,
        course::get_courses,
        course::get_my_courses,
        course::get_course_by_id,
        course::save_course,
        course::delete_course,
        course::set_published,
        learning::enroll,
        learning::unenroll,
        learning::get_enrollments,
        learning::get_course_progress,
        learning::mark_lesson,
        learning::record_event,
        profile::get_profile,
        profile::get_my_profile,
        profile::put_my_profile,
        upload::upload_course_image,
        upload::upload_lesson_file,
        upload::delete_upload
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Courses", description = "Authoring and browsing courses"),
        (name = "Learning", description = "Enrollments and lesson progress"),
        (name = "Profiles", description = "Public user profiles"),
        (name = "Uploads", description = "Course images and lesson files"),
    ),
    info(
        title = "Course Authoring API",
        version = "1.0.0",
        description = "Build courses from modules and lessons, and follow them as a student",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;
