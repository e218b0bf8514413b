use crate::media::MediaKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by editing operations and by [`CourseTree::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("module {0} not found")]
    ModuleNotFound(Uuid),
    #[error("lesson {0} not found")]
    LessonNotFound(Uuid),
    #[error("id {0} is already used in this course")]
    DuplicateId(Uuid),
    #[error("order {order} is used twice under {parent}")]
    DuplicateOrder { parent: Uuid, order: i32 },
    #[error("order {order} of {id} is negative")]
    NegativeOrder { id: Uuid, order: i32 },
    #[error("title of {0} is empty")]
    EmptyTitle(Uuid),
    #[error("index {index} is out of range for a list of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A file attached to a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    /// `None` is a placeholder lesson without a file
    pub content: Option<Content>,
}

impl Lesson {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            order: 0,
            content: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    pub lessons: Vec<Lesson>,
}

impl Module {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            order: 0,
            lessons: Vec::new(),
        }
    }

    fn renumber(&mut self) {
        renumber(&mut self.lessons, |lesson, order| lesson.order = order);
    }
}

/// The authoring-time representation of one course.
///
/// Ids are generated client-side so that identity survives an editing
/// session before the first save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTree {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub teacher_id: Uuid,
    pub modules: Vec<Module>,
}

impl CourseTree {
    pub fn new(teacher_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            image_url: None,
            is_published: false,
            teacher_id,
            modules: Vec::new(),
        }
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_details(&mut self, description: impl Into<String>, category: impl Into<String>) {
        self.description = description.into();
        self.category = category.into();
    }

    pub fn set_image(&mut self, image_url: Option<String>) {
        self.image_url = image_url;
    }

    pub fn set_published(&mut self, published: bool) {
        self.is_published = published;
    }

    pub fn module(&self, module_id: Uuid) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn lesson(&self, lesson_id: Uuid) -> Option<&Lesson> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .find(|l| l.id == lesson_id)
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    /// Appends a new empty module and returns its id
    pub fn add_module(&mut self, title: impl Into<String>) -> Uuid {
        let module = Module::new(title);
        let id = module.id;
        self.modules.push(module);
        self.renumber_modules();
        id
    }

    /// Appends an existing module, keeping its id and lessons
    pub fn insert_module(&mut self, mut module: Module) -> Result<(), TreeError> {
        if self.id_in_use(module.id) {
            return Err(TreeError::DuplicateId(module.id));
        }
        let mut incoming = HashSet::from([module.id]);
        for lesson in &module.lessons {
            if self.id_in_use(lesson.id) || !incoming.insert(lesson.id) {
                return Err(TreeError::DuplicateId(lesson.id));
            }
        }

        module.renumber();
        self.modules.push(module);
        self.renumber_modules();
        Ok(())
    }

    pub fn rename_module(
        &mut self,
        module_id: Uuid,
        title: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.module_mut(module_id)?.title = title.into();
        Ok(())
    }

    /// Removes a module together with all of its lessons
    pub fn delete_module(&mut self, module_id: Uuid) -> Result<Module, TreeError> {
        let index = self.module_index(module_id)?;
        let removed = self.modules.remove(index);
        self.renumber_modules();
        Ok(removed)
    }

    /// Appends a new placeholder lesson to a module and returns its id
    pub fn add_lesson(
        &mut self,
        module_id: Uuid,
        title: impl Into<String>,
    ) -> Result<Uuid, TreeError> {
        let lesson = Lesson::new(title);
        let id = lesson.id;
        self.insert_lesson(module_id, lesson)?;
        Ok(id)
    }

    pub fn insert_lesson(&mut self, module_id: Uuid, lesson: Lesson) -> Result<(), TreeError> {
        if self.id_in_use(lesson.id) {
            return Err(TreeError::DuplicateId(lesson.id));
        }

        let module = self.module_mut(module_id)?;
        module.lessons.push(lesson);
        module.renumber();
        Ok(())
    }

    pub fn rename_lesson(
        &mut self,
        lesson_id: Uuid,
        title: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.lesson_mut(lesson_id)?.title = title.into();
        Ok(())
    }

    pub fn delete_lesson(&mut self, lesson_id: Uuid) -> Result<Lesson, TreeError> {
        let (module_index, lesson_index) = self.lesson_position(lesson_id)?;
        let module = &mut self.modules[module_index];
        let removed = module.lessons.remove(lesson_index);
        module.renumber();
        Ok(removed)
    }

    /// Attaches a file to a lesson, replacing any previous one
    pub fn attach_content(&mut self, lesson_id: Uuid, content: Content) -> Result<(), TreeError> {
        self.lesson_mut(lesson_id)?.content = Some(content);
        Ok(())
    }

    /// Detaches the lesson's file and returns it, if there was one
    pub fn detach_content(&mut self, lesson_id: Uuid) -> Result<Option<Content>, TreeError> {
        Ok(self.lesson_mut(lesson_id)?.content.take())
    }

    /// Moves the module at `from` to index `to`, renumbering all modules
    pub fn move_module(&mut self, from: usize, to: usize) -> Result<(), TreeError> {
        move_item(&mut self.modules, from, to)?;
        self.renumber_modules();
        Ok(())
    }

    /// Moves a lesson within its module
    pub fn move_lesson(&mut self, module_id: Uuid, from: usize, to: usize) -> Result<(), TreeError> {
        let module = self.module_mut(module_id)?;
        move_item(&mut module.lessons, from, to)?;
        module.renumber();
        Ok(())
    }

    /// Moves a lesson into another module at `index`, renumbering both lists
    pub fn move_lesson_to_module(
        &mut self,
        lesson_id: Uuid,
        target_module: Uuid,
        index: usize,
    ) -> Result<(), TreeError> {
        let target_index = self.module_index(target_module)?;
        let (source_index, lesson_index) = self.lesson_position(lesson_id)?;

        let target_len = self.modules[target_index].lessons.len();
        let max_index = if source_index == target_index {
            target_len - 1
        } else {
            target_len
        };
        if index > max_index {
            return Err(TreeError::IndexOutOfRange {
                index,
                len: max_index + 1,
            });
        }

        let lesson = self.modules[source_index].lessons.remove(lesson_index);
        self.modules[target_index].lessons.insert(index, lesson);

        self.modules[source_index].renumber();
        self.modules[target_index].renumber();
        Ok(())
    }

    /// Checks the invariants the persistence gateway relies on.
    ///
    /// Ids must be unique across the whole course, sibling orders must be
    /// unique and non-negative, and titles must not be blank. Orders do not
    /// have to be dense.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.title.trim().is_empty() {
            return Err(TreeError::EmptyTitle(self.id));
        }

        let mut ids = HashSet::from([self.id]);
        let mut module_orders = HashSet::new();

        for module in &self.modules {
            if !ids.insert(module.id) {
                return Err(TreeError::DuplicateId(module.id));
            }
            check_order(self.id, module.id, module.order, &mut module_orders)?;
            if module.title.trim().is_empty() {
                return Err(TreeError::EmptyTitle(module.id));
            }

            let mut lesson_orders = HashSet::new();
            for lesson in &module.lessons {
                if !ids.insert(lesson.id) {
                    return Err(TreeError::DuplicateId(lesson.id));
                }
                check_order(module.id, lesson.id, lesson.order, &mut lesson_orders)?;
                if lesson.title.trim().is_empty() {
                    return Err(TreeError::EmptyTitle(lesson.id));
                }
            }
        }

        Ok(())
    }

    fn id_in_use(&self, id: Uuid) -> bool {
        self.id == id
            || self
                .modules
                .iter()
                .any(|m| m.id == id || m.lessons.iter().any(|l| l.id == id))
    }

    fn module_index(&self, module_id: Uuid) -> Result<usize, TreeError> {
        self.modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or(TreeError::ModuleNotFound(module_id))
    }

    fn module_mut(&mut self, module_id: Uuid) -> Result<&mut Module, TreeError> {
        self.modules
            .iter_mut()
            .find(|m| m.id == module_id)
            .ok_or(TreeError::ModuleNotFound(module_id))
    }

    fn lesson_position(&self, lesson_id: Uuid) -> Result<(usize, usize), TreeError> {
        self.modules
            .iter()
            .enumerate()
            .find_map(|(mi, m)| {
                m.lessons
                    .iter()
                    .position(|l| l.id == lesson_id)
                    .map(|li| (mi, li))
            })
            .ok_or(TreeError::LessonNotFound(lesson_id))
    }

    fn lesson_mut(&mut self, lesson_id: Uuid) -> Result<&mut Lesson, TreeError> {
        self.modules
            .iter_mut()
            .flat_map(|m| m.lessons.iter_mut())
            .find(|l| l.id == lesson_id)
            .ok_or(TreeError::LessonNotFound(lesson_id))
    }

    fn renumber_modules(&mut self) {
        renumber(&mut self.modules, |module, order| module.order = order);
    }
}

fn check_order(
    parent: Uuid,
    id: Uuid,
    order: i32,
    seen: &mut HashSet<i32>,
) -> Result<(), TreeError> {
    if order < 0 {
        return Err(TreeError::NegativeOrder { id, order });
    }
    if !seen.insert(order) {
        return Err(TreeError::DuplicateOrder { parent, order });
    }
    Ok(())
}

/// Rewrites `order` so that it matches the list position, 0-based
fn renumber<T>(items: &mut [T], mut set: impl FnMut(&mut T, i32)) {
    for (idx, item) in items.iter_mut().enumerate() {
        set(item, idx as i32);
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), TreeError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
    }

    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}
