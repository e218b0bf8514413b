use crate::error::UploadError;
use models::media::MediaKind;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

const MIB: u64 = 1024 * 1024;

const IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

/// The two public containers uploads land in
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Bucket {
    /// Course cover images
    CourseImages,
    /// Videos and documents attached to lessons
    LessonFiles,
}

impl Bucket {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Largest object accepted, in bytes
    pub fn max_size(&self) -> u64 {
        match self {
            Self::CourseImages => 5 * MIB,
            Self::LessonFiles => 512 * MIB,
        }
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        match self {
            Self::CourseImages => IMAGE_TYPES.contains(&essence(content_type).as_str()),
            Self::LessonFiles => MediaKind::classify(content_type).is_some(),
        }
    }
}

/// Where in a course an upload belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    CourseImage {
        course: Uuid,
    },
    LessonFile {
        course: Uuid,
        module: Uuid,
        lesson: Uuid,
    },
}

impl UploadTarget {
    pub fn bucket(&self) -> Bucket {
        match self {
            Self::CourseImage { .. } => Bucket::CourseImages,
            Self::LessonFile { .. } => Bucket::LessonFiles,
        }
    }

    pub fn course(&self) -> Uuid {
        match *self {
            Self::CourseImage { course } | Self::LessonFile { course, .. } => course,
        }
    }
}

/// A file somebody wants to put into storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub owner: Uuid,
    pub target: UploadTarget,
    pub file_name: String,
    pub content_type: String,
    /// Size the client announced
    pub size: u64,
}

impl UploadRequest {
    /// Checks type and size against the target bucket. `received` is the
    /// number of bytes actually in hand.
    pub fn validate(&self, received: u64) -> Result<(), UploadError> {
        let bucket = self.target.bucket();

        if !bucket.accepts(&self.content_type) {
            return Err(UploadError::UnsupportedType {
                bucket,
                content_type: self.content_type.clone(),
            });
        }
        if self.size == 0 || received == 0 {
            return Err(UploadError::Empty);
        }
        if self.size > bucket.max_size() || received > bucket.max_size() {
            return Err(UploadError::TooLarge {
                bucket,
                size: self.size.max(received),
                limit: bucket.max_size(),
            });
        }
        if self.size != received {
            return Err(UploadError::SizeMismatch {
                declared: self.size,
                received,
            });
        }

        Ok(())
    }
}

/// Lowercased MIME type without parameters
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn lesson_request(content_type: &str, size: u64) -> UploadRequest {
        UploadRequest {
            owner: Uuid::new_v4(),
            target: UploadTarget::LessonFile {
                course: Uuid::new_v4(),
                module: Uuid::new_v4(),
                lesson: Uuid::new_v4(),
            },
            file_name: "lecture.mp4".into(),
            content_type: content_type.into(),
            size,
        }
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(Bucket::CourseImages.as_str(), "course-images");
        assert_eq!(Bucket::LessonFiles.to_string(), "lesson-files");
        assert_eq!(
            Bucket::from_str("lesson-files").unwrap(),
            Bucket::LessonFiles
        );
        assert!(Bucket::from_str("avatars").is_err());
    }

    #[test]
    fn test_bucket_accepts() {
        assert!(Bucket::CourseImages.accepts("image/png"));
        assert!(Bucket::CourseImages.accepts("IMAGE/JPEG; charset=binary"));
        assert!(!Bucket::CourseImages.accepts("image/svg+xml"));
        assert!(!Bucket::CourseImages.accepts("video/mp4"));

        assert!(Bucket::LessonFiles.accepts("video/webm"));
        assert!(Bucket::LessonFiles.accepts("application/pdf"));
        assert!(!Bucket::LessonFiles.accepts("image/png"));
        assert!(!Bucket::LessonFiles.accepts("application/zip"));
    }

    #[test]
    fn test_validate() {
        assert!(lesson_request("video/mp4", 1024).validate(1024).is_ok());

        assert!(matches!(
            lesson_request("audio/mpeg", 1024).validate(1024),
            Err(UploadError::UnsupportedType { .. })
        ));
        assert!(matches!(
            lesson_request("video/mp4", 0).validate(0),
            Err(UploadError::Empty)
        ));
        assert!(matches!(
            lesson_request("video/mp4", 1024).validate(512),
            Err(UploadError::SizeMismatch {
                declared: 1024,
                received: 512
            })
        ));

        let huge = 513 * MIB;
        assert!(matches!(
            lesson_request("video/mp4", huge).validate(huge),
            Err(UploadError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_image_size_limit() {
        let request = UploadRequest {
            owner: Uuid::new_v4(),
            target: UploadTarget::CourseImage {
                course: Uuid::new_v4(),
            },
            file_name: "cover.png".into(),
            content_type: "image/png".into(),
            size: 6 * MIB,
        };

        assert!(matches!(
            request.validate(6 * MIB),
            Err(UploadError::TooLarge {
                bucket: Bucket::CourseImages,
                ..
            })
        ));
    }
}
