use thiserror::Error;
use uuid::Uuid;

/// A row or object whose access is being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    Profile { subject: Uuid },
    /// Modules and lessons are checked against their course
    Course { owner: Uuid, published: bool },
    Enrollment { student: Uuid },
    Progress { student: Uuid },
    /// An entry in one of the public storage buckets
    Object { key: &'a str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("authentication required")]
    Unauthenticated,
    #[error("caller may not {action:?} this resource")]
    NotPermitted { action: Action },
}

/// Checks whether `caller` may perform `action` on `resource`.
///
/// `caller` is `None` for anonymous requests.
pub fn authorize(
    caller: Option<Uuid>,
    resource: Resource<'_>,
    action: Action,
) -> Result<(), AccessDenied> {
    let allowed = match (resource, action) {
        (Resource::Profile { .. }, Action::Read) => caller.is_some(),
        (Resource::Profile { subject }, Action::Write) => caller == Some(subject),

        (Resource::Course { published: true, .. }, Action::Read) => true,
        (Resource::Course { owner, .. }, _) => caller == Some(owner),

        (Resource::Enrollment { student }, _) | (Resource::Progress { student }, _) => {
            caller == Some(student)
        }

        (Resource::Object { .. }, Action::Read) => true,
        (Resource::Object { key }, Action::Write) => match caller {
            Some(caller) => owner_prefix(key) == Some(caller),
            None => false,
        },
    };

    if allowed {
        Ok(())
    } else if caller.is_none() {
        Err(AccessDenied::Unauthenticated)
    } else {
        Err(AccessDenied::NotPermitted { action })
    }
}

/// The owner id encoded as the first segment of an object key
fn owner_prefix(key: &str) -> Option<Uuid> {
    key.split('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_rules() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let profile = Resource::Profile { subject: me };

        assert!(authorize(Some(other), profile, Action::Read).is_ok());
        assert_eq!(
            authorize(None, profile, Action::Read),
            Err(AccessDenied::Unauthenticated)
        );
        assert!(authorize(Some(me), profile, Action::Write).is_ok());
        assert_eq!(
            authorize(Some(other), profile, Action::Write),
            Err(AccessDenied::NotPermitted {
                action: Action::Write
            })
        );
    }

    #[test]
    fn test_course_rules() {
        let owner = Uuid::new_v4();
        let student = Uuid::new_v4();
        let draft = Resource::Course {
            owner,
            published: false,
        };
        let published = Resource::Course {
            owner,
            published: true,
        };

        assert!(authorize(Some(owner), draft, Action::Read).is_ok());
        assert!(authorize(Some(student), draft, Action::Read).is_err());
        assert!(authorize(Some(student), published, Action::Read).is_ok());
        assert!(authorize(None, published, Action::Read).is_ok());

        assert!(authorize(Some(owner), published, Action::Write).is_ok());
        assert!(authorize(Some(student), published, Action::Write).is_err());
        assert_eq!(
            authorize(None, draft, Action::Write),
            Err(AccessDenied::Unauthenticated)
        );
    }

    #[test]
    fn test_student_rows() {
        let student = Uuid::new_v4();
        let teacher = Uuid::new_v4();

        for resource in [
            Resource::Enrollment { student },
            Resource::Progress { student },
        ] {
            assert!(authorize(Some(student), resource, Action::Read).is_ok());
            assert!(authorize(Some(student), resource, Action::Write).is_ok());
            assert!(authorize(Some(teacher), resource, Action::Read).is_err());
            assert!(authorize(Some(teacher), resource, Action::Write).is_err());
        }
    }

    #[test]
    fn test_object_rules() {
        let owner = Uuid::new_v4();
        let key = format!("{owner}/{}/cover.png", Uuid::new_v4());
        let object = Resource::Object { key: &key };

        assert!(authorize(None, object, Action::Read).is_ok());
        assert!(authorize(Some(owner), object, Action::Write).is_ok());
        assert!(authorize(Some(Uuid::new_v4()), object, Action::Write).is_err());
        assert_eq!(
            authorize(None, object, Action::Write),
            Err(AccessDenied::Unauthenticated)
        );
        assert!(
            authorize(
                Some(owner),
                Resource::Object {
                    key: "not-a-uuid/file.png"
                },
                Action::Write
            )
            .is_err()
        );
    }
}
