use crate::bucket::{UploadTarget, essence};
use std::path::Path;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 8;

/// Generates a fresh object key for an upload.
///
/// Keys are `{owner}/{course}/{uuid}.{ext}` for course images and
/// `{owner}/{course}/{module}/{lesson}/{uuid}.{ext}` for lesson files, so
/// the first segment always names the uploader.
pub fn object_key(
    owner: Uuid,
    target: &UploadTarget,
    file_name: &str,
    content_type: &str,
) -> String {
    let ext = extension(file_name, content_type);
    let id = Uuid::new_v4();

    match target {
        UploadTarget::CourseImage { course } => format!("{owner}/{course}/{id}.{ext}"),
        UploadTarget::LessonFile {
            course,
            module,
            lesson,
        } => format!("{owner}/{course}/{module}/{lesson}/{id}.{ext}"),
    }
}

/// File extension for a key, taken from the file name when it is usable and
/// from the content type otherwise
pub fn extension(file_name: &str, content_type: &str) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    from_name.unwrap_or_else(|| {
        match essence(content_type).as_str() {
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            "application/pdf" => "pdf",
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_key_layout() {
        let owner = Uuid::new_v4();
        let (course, module, lesson) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let target = UploadTarget::LessonFile {
            course,
            module,
            lesson,
        };

        let key = object_key(owner, &target, "Week 1.MP4", "video/mp4");
        let segments: Vec<&str> = key.split('/').collect();

        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0], owner.to_string());
        assert_eq!(segments[1], course.to_string());
        assert_eq!(segments[2], module.to_string());
        assert_eq!(segments[3], lesson.to_string());
        assert!(segments[4].ends_with(".mp4"));
        assert!(Uuid::parse_str(segments[4].trim_end_matches(".mp4")).is_ok());
    }

    #[test]
    fn test_image_key_layout() {
        let owner = Uuid::new_v4();
        let course = Uuid::new_v4();
        let key = object_key(
            owner,
            &UploadTarget::CourseImage { course },
            "cover.png",
            "image/png",
        );

        assert!(key.starts_with(&format!("{owner}/{course}/")));
        assert_eq!(key.split('/').count(), 3);
    }

    #[test]
    fn test_keys_are_unique() {
        let target = UploadTarget::CourseImage {
            course: Uuid::new_v4(),
        };
        let owner = Uuid::new_v4();

        assert_ne!(
            object_key(owner, &target, "a.png", "image/png"),
            object_key(owner, &target, "a.png", "image/png")
        );
    }

    #[test]
    fn test_extension_fallbacks() {
        assert_eq!(extension("notes.PDF", "application/pdf"), "pdf");
        assert_eq!(extension("notes", "application/pdf"), "pdf");
        assert_eq!(extension("clip.m p4", "video/mp4"), "mp4");
        assert_eq!(extension("../../etc", "image/jpeg"), "jpg");
        assert_eq!(extension("blob", "application/x-unknown"), "bin");
    }
}
