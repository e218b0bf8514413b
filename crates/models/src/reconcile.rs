use crate::tree::CourseTree;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// The stored rows of one course, reduced to what reconciliation needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTree {
    /// Owner of the stored course row, `None` if the course was never saved
    pub course_owner: Option<Uuid>,
    pub modules: HashSet<Uuid>,
    /// lesson id -> module id
    pub lessons: HashMap<Uuid, Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub id: Uuid,
    pub kind: ChangeKind,
}

/// Writes needed to turn the persisted rows into the desired tree.
///
/// Every module and lesson of the input is written; anything stored under
/// the course that the input no longer names is deleted. An empty list
/// therefore clears its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub course: ChangeKind,
    pub module_writes: Vec<Change>,
    pub lesson_writes: Vec<Change>,
    pub module_deletes: Vec<Uuid>,
    pub lesson_deletes: Vec<Uuid>,
}

impl ReconcilePlan {
    /// Ids of the modules and lessons this plan creates.
    ///
    /// None of these may already exist under a different course.
    pub fn inserted_modules(&self) -> Vec<Uuid> {
        inserted(&self.module_writes)
    }

    pub fn inserted_lessons(&self) -> Vec<Uuid> {
        inserted(&self.lesson_writes)
    }

    pub fn deletes_anything(&self) -> bool {
        !self.module_deletes.is_empty() || !self.lesson_deletes.is_empty()
    }
}

fn inserted(changes: &[Change]) -> Vec<Uuid> {
    changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Insert)
        .map(|c| c.id)
        .collect()
}

fn change(id: Uuid, exists: bool) -> Change {
    Change {
        id,
        kind: if exists {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        },
    }
}

/// Computes the writes that make `persisted` match `desired`.
///
/// A lesson that moved to another module of the same course is an update of
/// its parent, never a delete followed by an insert.
pub fn plan(persisted: &PersistedTree, desired: &CourseTree) -> ReconcilePlan {
    let course = if persisted.course_owner.is_some() {
        ChangeKind::Update
    } else {
        ChangeKind::Insert
    };

    let mut module_writes = Vec::with_capacity(desired.modules.len());
    let mut lesson_writes = Vec::with_capacity(desired.lesson_count());
    let mut desired_modules = HashSet::new();
    let mut desired_lessons = HashSet::new();

    for module in &desired.modules {
        desired_modules.insert(module.id);
        module_writes.push(change(module.id, persisted.modules.contains(&module.id)));

        for lesson in &module.lessons {
            desired_lessons.insert(lesson.id);
            lesson_writes.push(change(
                lesson.id,
                persisted.lessons.contains_key(&lesson.id),
            ));
        }
    }

    let mut module_deletes: Vec<Uuid> = persisted
        .modules
        .iter()
        .filter(|id| !desired_modules.contains(id))
        .copied()
        .collect();
    module_deletes.sort();

    let mut lesson_deletes: Vec<Uuid> = persisted
        .lessons
        .keys()
        .filter(|id| !desired_lessons.contains(id))
        .copied()
        .collect();
    lesson_deletes.sort();

    ReconcilePlan {
        course,
        module_writes,
        lesson_writes,
        module_deletes,
        lesson_deletes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        media::MediaKind,
        tree::{Content, Lesson},
    };

    fn persisted_of(tree: &CourseTree) -> PersistedTree {
        PersistedTree {
            course_owner: Some(tree.teacher_id),
            modules: tree.modules.iter().map(|m| m.id).collect(),
            lessons: tree
                .modules
                .iter()
                .flat_map(|m| m.lessons.iter().map(move |l| (l.id, m.id)))
                .collect(),
        }
    }

    #[test]
    fn test_new_course_inserts_everything() {
        let mut tree = CourseTree::new(Uuid::new_v4(), "Course");
        let module = tree.add_module("M1");
        tree.add_lesson(module, "L1").unwrap();

        let plan = plan(&PersistedTree::default(), &tree);

        assert_eq!(plan.course, ChangeKind::Insert);
        assert_eq!(plan.inserted_modules(), vec![module]);
        assert_eq!(plan.inserted_lessons().len(), 1);
        assert!(!plan.deletes_anything());
    }

    #[test]
    fn test_unchanged_tree_only_updates() {
        let mut tree = CourseTree::new(Uuid::new_v4(), "Course");
        let module = tree.add_module("M1");
        tree.add_lesson(module, "L1").unwrap();

        let plan = plan(&persisted_of(&tree), &tree);

        assert_eq!(plan.course, ChangeKind::Update);
        assert!(plan.inserted_modules().is_empty());
        assert!(plan.inserted_lessons().is_empty());
        assert!(plan.lesson_writes.iter().all(|c| c.kind == ChangeKind::Update));
        assert!(!plan.deletes_anything());
    }

    #[test]
    fn test_remove_and_add_lessons() {
        let mut tree = CourseTree::new(Uuid::new_v4(), "Course");
        let m1 = tree.add_module("M1");
        let l1 = tree.add_lesson(m1, "L1").unwrap();
        let l2 = tree.add_lesson(m1, "L2").unwrap();
        let before = persisted_of(&tree);

        tree.delete_lesson(l2).unwrap();
        let mut l3 = Lesson::new("L3");
        l3.content = Some(Content {
            name: "notes.pdf".into(),
            kind: MediaKind::Document,
            url: "https://files.example/notes.pdf".into(),
            size: 42,
        });
        let l3_id = l3.id;
        tree.insert_lesson(m1, l3).unwrap();
        tree.move_lesson(m1, 1, 0).unwrap();

        let plan = plan(&before, &tree);

        assert_eq!(
            plan.lesson_writes,
            vec![
                Change { id: l3_id, kind: ChangeKind::Insert },
                Change { id: l1, kind: ChangeKind::Update },
            ]
        );
        assert_eq!(plan.lesson_deletes, vec![l2]);
        assert!(plan.module_deletes.is_empty());
    }

    #[test]
    fn test_empty_modules_delete_everything() {
        let mut tree = CourseTree::new(Uuid::new_v4(), "Course");
        let m1 = tree.add_module("M1");
        let m2 = tree.add_module("M2");
        let l1 = tree.add_lesson(m1, "L1").unwrap();
        let l2 = tree.add_lesson(m2, "L2").unwrap();
        let before = persisted_of(&tree);

        tree.modules.clear();
        let plan = plan(&before, &tree);

        let mut modules = vec![m1, m2];
        modules.sort();
        let mut lessons = vec![l1, l2];
        lessons.sort();
        assert_eq!(plan.module_deletes, modules);
        assert_eq!(plan.lesson_deletes, lessons);
        assert!(plan.module_writes.is_empty());
    }

    #[test]
    fn test_empty_lesson_list_clears_module() {
        let mut tree = CourseTree::new(Uuid::new_v4(), "Course");
        let m1 = tree.add_module("M1");
        let l1 = tree.add_lesson(m1, "L1").unwrap();
        let before = persisted_of(&tree);

        tree.delete_lesson(l1).unwrap();
        let plan = plan(&before, &tree);

        assert_eq!(plan.lesson_deletes, vec![l1]);
        assert_eq!(
            plan.module_writes,
            vec![Change { id: m1, kind: ChangeKind::Update }]
        );
    }

    #[test]
    fn test_lesson_moved_between_modules_is_kept() {
        let mut tree = CourseTree::new(Uuid::new_v4(), "Course");
        let m1 = tree.add_module("M1");
        let m2 = tree.add_module("M2");
        let l1 = tree.add_lesson(m1, "L1").unwrap();
        let before = persisted_of(&tree);

        tree.move_lesson_to_module(l1, m2, 0).unwrap();
        tree.delete_module(m1).unwrap();
        let plan = plan(&before, &tree);

        assert_eq!(plan.module_deletes, vec![m1]);
        assert!(plan.lesson_deletes.is_empty());
        assert_eq!(
            plan.lesson_writes,
            vec![Change { id: l1, kind: ChangeKind::Update }]
        );
    }
}
