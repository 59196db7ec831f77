use std::collections::HashSet;
use std::path::Path;

use bincode::Options;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sled::{Batch, Config, Tree};
use tracing::{debug, warn};

use crate::{
    application::services::{Repository, UnitOfWork},
    domain::{CourseInstance, CourseTemplate, DomainError, Entity, Person, TeacherRegistration},
};

const RECORDS_TREE: &str = "records";

/// Embedded data store backed by `sled`.
///
/// Every entity lives in a single tree under `<collection>/<key>`, so a full
/// scan of one collection is a prefix scan and a commit is one atomic batch.
pub struct SledStore {
    records: Tree,
    staged: Mutex<Vec<(String, Vec<u8>)>>,
    write_lock: Mutex<()>,
}

impl SledStore {
    /// Opens (or creates) a sled database rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|err| {
            DomainError::storage(format!("failed to create data directory {:?}: {err}", dir))
        })?;

        let db = Config::default()
            .path(&dir)
            .cache_capacity(16 * 1024 * 1024)
            .open()
            .map_err(|err| DomainError::storage(format!("failed to open sled db: {err}")))?;

        let records = db
            .open_tree(RECORDS_TREE)
            .map_err(|err| DomainError::storage(format!("failed to open records tree: {err}")))?;

        Ok(Self {
            records,
            staged: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .serialize(value)
            .map_err(|err| DomainError::storage(format!("serialization error: {err}")))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::storage(format!("deserialization error: {err}")))
    }

    fn collection_prefix<T: Entity>() -> String {
        format!("{}/", T::COLLECTION)
    }

    fn encode_key<T: Entity>(item: &T) -> String {
        format!("{}{}", Self::collection_prefix::<T>(), item.key())
    }
}

impl<T: Entity> Repository<T> for SledStore {
    fn all(&self) -> Result<Vec<T>, DomainError> {
        let prefix = Self::collection_prefix::<T>();
        let mut items = Vec::new();

        for entry in self.records.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry.map_err(|err| {
                DomainError::storage(format!("failed to read {} record: {err}", T::COLLECTION))
            })?;
            items.push(Self::deserialize(value.as_ref())?);
        }

        Ok(items)
    }

    fn add(&self, item: T) -> Result<(), DomainError> {
        let bytes = Self::serialize(&item)?;
        self.staged.lock().push((Self::encode_key(&item), bytes));
        Ok(())
    }
}

impl UnitOfWork for SledStore {
    fn persons(&self) -> &dyn Repository<Person> {
        self
    }

    fn course_templates(&self) -> &dyn Repository<CourseTemplate> {
        self
    }

    fn course_instances(&self) -> &dyn Repository<CourseInstance> {
        self
    }

    fn teacher_registrations(&self) -> &dyn Repository<TeacherRegistration> {
        self
    }

    /// `apply_batch` is the commit point: once it succeeds every staged record
    /// is visible and `Ok` is returned. The flush that follows only hastens
    /// durability, so its failure is logged rather than reported.
    fn save(&self) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        let staged = std::mem::take(&mut *self.staged.lock());
        if staged.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(staged.len());
        for (key, _) in &staged {
            let exists = self
                .records
                .contains_key(key.as_bytes())
                .map_err(|err| DomainError::storage(format!("failed to read key {key}: {err}")))?;
            if exists || !seen.insert(key.as_str()) {
                return Err(DomainError::storage(format!("duplicate key {key}")));
            }
        }

        let written = staged.len();
        let mut batch = Batch::default();
        for (key, bytes) in staged {
            batch.insert(key.into_bytes(), bytes);
        }

        self.records
            .apply_batch(batch)
            .map_err(|err| DomainError::storage(format!("failed to commit batch: {err}")))?;

        if let Err(err) = self.records.flush() {
            warn!(target: "course_registry::storage", written, %err, "flush after commit failed");
        }

        debug!(target: "course_registry::storage", written, "sled commit");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TeacherType;
    use tempfile::tempdir;

    #[test]
    fn test_commit_survives_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = SledStore::open(dir.path()).unwrap();
            store
                .persons()
                .add(Person::new("1203735289", "Daníel"))
                .unwrap();
            store
                .teacher_registrations()
                .add(TeacherRegistration::new("1203735289", 7, TeacherType::MainTeacher))
                .unwrap();
            store.save().unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        let registrations = store.teacher_registrations().all().unwrap();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].course_instance_id, 7);
        assert_eq!(store.persons().all().unwrap()[0].name, "Daníel");
    }

    #[test]
    fn test_collections_do_not_bleed() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        store
            .course_templates()
            .add(CourseTemplate::new("T-514-VEFT", "Vefþjónustur"))
            .unwrap();
        store
            .course_instances()
            .add(CourseInstance::new(1, "T-514-VEFT", "20153"))
            .unwrap();
        store.save().unwrap();

        assert_eq!(store.course_templates().all().unwrap().len(), 1);
        assert_eq!(store.course_instances().all().unwrap().len(), 1);
        assert!(store.persons().all().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_key_rejects_whole_batch() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        store.persons().add(Person::new("1", "A")).unwrap();
        store.save().unwrap();

        store.persons().add(Person::new("2", "B")).unwrap();
        store.persons().add(Person::new("1", "A again")).unwrap();

        assert!(matches!(store.save(), Err(DomainError::Storage(_))));
        let persons = store.persons().all().unwrap();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].name, "A");
    }

    #[test]
    fn test_save_result_matches_visibility() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        store
            .teacher_registrations()
            .add(TeacherRegistration::new("1", 3, TeacherType::MainTeacher))
            .unwrap();

        assert!(store.save().is_ok());
        assert_eq!(store.teacher_registrations().all().unwrap().len(), 1);

        store
            .teacher_registrations()
            .add(TeacherRegistration::new("2", 3, TeacherType::AssistantTeacher))
            .unwrap();
        store
            .teacher_registrations()
            .add(TeacherRegistration::new("1", 3, TeacherType::MainTeacher))
            .unwrap();

        assert!(store.save().is_err());
        let registrations = store.teacher_registrations().all().unwrap();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].ssn, "1");

        // Nothing from the rejected batch lingers for the next commit.
        store.save().unwrap();
        assert_eq!(store.teacher_registrations().all().unwrap().len(), 1);
    }

    #[test]
    fn test_instances_scan_in_id_order() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        for id in [10, 2, 1] {
            store
                .course_instances()
                .add(CourseInstance::new(id, "T-1", "20153"))
                .unwrap();
        }
        store.save().unwrap();

        let ids: Vec<i64> = store
            .course_instances()
            .all()
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 10]);
    }
}
