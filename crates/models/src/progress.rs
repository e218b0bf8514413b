use serde::{Deserialize, Serialize};

/// Fraction of a video that has to be watched before the lesson counts as done
pub const VIDEO_COMPLETION_THRESHOLD: f64 = 0.9;

/// Something a student did with a lesson's content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompletionEvent {
    /// Playback position report from the video player
    VideoProgress { position_secs: f64, duration_secs: f64 },
    DocumentOpened,
}

impl CompletionEvent {
    /// Whether this event completes the lesson
    pub fn completes(&self) -> bool {
        match *self {
            Self::VideoProgress {
                position_secs,
                duration_secs,
            } => {
                duration_secs.is_finite()
                    && duration_secs > 0.0
                    && position_secs >= duration_secs * VIDEO_COMPLETION_THRESHOLD
            }
            Self::DocumentOpened => true,
        }
    }
}

/// Completion summary of one student in one course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub percent: u8,
}

impl CourseProgress {
    pub fn new(total_lessons: u64, completed_lessons: u64) -> Self {
        let completed_lessons = completed_lessons.min(total_lessons);
        let percent = if total_lessons == 0 {
            0
        } else {
            (completed_lessons * 100 / total_lessons) as u8
        };

        Self {
            total_lessons,
            completed_lessons,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons == self.total_lessons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_threshold() {
        let watched = |position_secs| CompletionEvent::VideoProgress {
            position_secs,
            duration_secs: 100.0,
        };

        assert!(!watched(10.0).completes());
        assert!(!watched(89.9).completes());
        assert!(watched(90.0).completes());
        assert!(watched(100.0).completes());
    }

    #[test]
    fn test_unknown_duration_never_completes() {
        let event = CompletionEvent::VideoProgress {
            position_secs: 50.0,
            duration_secs: 0.0,
        };
        assert!(!event.completes());

        let event = CompletionEvent::VideoProgress {
            position_secs: 50.0,
            duration_secs: f64::NAN,
        };
        assert!(!event.completes());
    }

    #[test]
    fn test_document_opened_completes() {
        assert!(CompletionEvent::DocumentOpened.completes());
    }

    #[test]
    fn test_event_json() {
        let event: CompletionEvent = serde_json::from_str(
            r#"{"event":"video_progress","position_secs":95.0,"duration_secs":100.0}"#,
        )
        .unwrap();
        assert!(event.completes());

        let event: CompletionEvent =
            serde_json::from_str(r#"{"event":"document_opened"}"#).unwrap();
        assert_eq!(event, CompletionEvent::DocumentOpened);
    }

    #[test]
    fn test_course_progress_percent() {
        assert_eq!(CourseProgress::new(0, 0).percent, 0);
        assert_eq!(CourseProgress::new(3, 1).percent, 33);
        assert_eq!(CourseProgress::new(4, 4).percent, 100);
        assert!(CourseProgress::new(4, 4).is_complete());
        assert!(!CourseProgress::new(0, 0).is_complete());
        // stale rows for deleted lessons never push past 100%
        assert_eq!(CourseProgress::new(2, 5).completed_lessons, 2);
    }
}
