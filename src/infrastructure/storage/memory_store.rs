use std::collections::HashSet;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::{
    application::services::{Repository, UnitOfWork},
    domain::{CourseInstance, CourseTemplate, DomainError, Entity, Person, TeacherRegistration},
};

/// One entity kind: committed rows plus the rows staged for the next save.
struct Collection<T> {
    committed: RwLock<Vec<T>>,
    staged: Mutex<Vec<T>>,
}

impl<T: Entity> Collection<T> {
    fn new() -> Self {
        Self {
            committed: RwLock::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
        }
    }

    fn check_staged(&self) -> Result<(), DomainError> {
        let committed = self.committed.read();
        let mut keys: HashSet<String> = committed.iter().map(Entity::key).collect();

        for item in self.staged.lock().iter() {
            let key = item.key();
            if !keys.insert(key.clone()) {
                return Err(DomainError::storage(format!(
                    "duplicate key {}/{key}",
                    T::COLLECTION
                )));
            }
        }

        Ok(())
    }

    fn commit(&self) -> usize {
        let staged = std::mem::take(&mut *self.staged.lock());
        let count = staged.len();
        self.committed.write().extend(staged);
        count
    }

    fn discard(&self) {
        self.staged.lock().clear();
    }
}

impl<T: Entity> Repository<T> for Collection<T> {
    fn all(&self) -> Result<Vec<T>, DomainError> {
        Ok(self.committed.read().clone())
    }

    fn add(&self, item: T) -> Result<(), DomainError> {
        self.staged.lock().push(item);
        Ok(())
    }
}

/// Volatile data store keeping every collection in memory.
///
/// Rows come back from `all` in insertion order.
pub struct InMemoryStore {
    persons: Collection<Person>,
    course_templates: Collection<CourseTemplate>,
    course_instances: Collection<CourseInstance>,
    teacher_registrations: Collection<TeacherRegistration>,
    write_lock: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            persons: Collection::new(),
            course_templates: Collection::new(),
            course_instances: Collection::new(),
            teacher_registrations: Collection::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn check_staged(&self) -> Result<(), DomainError> {
        self.persons.check_staged()?;
        self.course_templates.check_staged()?;
        self.course_instances.check_staged()?;
        self.teacher_registrations.check_staged()
    }

    fn discard(&self) {
        self.persons.discard();
        self.course_templates.discard();
        self.course_instances.discard();
        self.teacher_registrations.discard();
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitOfWork for InMemoryStore {
    fn persons(&self) -> &dyn Repository<Person> {
        &self.persons
    }

    fn course_templates(&self) -> &dyn Repository<CourseTemplate> {
        &self.course_templates
    }

    fn course_instances(&self) -> &dyn Repository<CourseInstance> {
        &self.course_instances
    }

    fn teacher_registrations(&self) -> &dyn Repository<TeacherRegistration> {
        &self.teacher_registrations
    }

    fn save(&self) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        if let Err(err) = self.check_staged() {
            self.discard();
            return Err(err);
        }

        let written = self.persons.commit()
            + self.course_templates.commit()
            + self.course_instances.commit()
            + self.teacher_registrations.commit();

        debug!(target: "course_registry::storage", written, "in-memory commit");

        Ok(())
    }
}
