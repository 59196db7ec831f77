use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::DomainError;

pub type CourseInstanceId = i64;

/// Stable validation codes surfaced through `DomainError::Validation`.
pub mod codes {
    pub const COURSE_ALREADY_HAS_A_MAIN_TEACHER: &str = "COURSE_ALREADY_HAS_A_MAIN_TEACHER";
    pub const PERSON_ALREADY_REGISTERED_TEACHER_IN_COURSE: &str =
        "PERSON_ALREADY_REGISTERED_TEACHER_IN_COURSE";
}

/// A record kind the data store keeps in its own collection.
///
/// Storage adapters are written once against this trait; `key` must be unique
/// within the collection.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn key(&self) -> String;
}

/// A person known to the registry, identified by national identity code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub ssn: String,
    pub name: String,
}

impl Person {
    pub fn new(ssn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ssn: ssn.into(),
            name: name.into(),
        }
    }
}

/// Catalogue definition of a course, independent of semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTemplate {
    pub course_id: String,
    pub name: String,
}

impl CourseTemplate {
    pub fn new(course_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            name: name.into(),
        }
    }
}

/// A single offering of a template in a given semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInstance {
    pub id: CourseInstanceId,
    pub course_id: String,
    pub semester: String,
}

impl CourseInstance {
    pub fn new(
        id: CourseInstanceId,
        course_id: impl Into<String>,
        semester: impl Into<String>,
    ) -> Self {
        Self {
            id,
            course_id: course_id.into(),
            semester: semester.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeacherType {
    MainTeacher,
    AssistantTeacher,
}

impl TeacherType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherType::MainTeacher => "MainTeacher",
            TeacherType::AssistantTeacher => "AssistantTeacher",
        }
    }
}

impl fmt::Display for TeacherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeacherType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "mainteacher" => Ok(TeacherType::MainTeacher),
            "assistant" | "assistantteacher" => Ok(TeacherType::AssistantTeacher),
            other => Err(DomainError::other(format!("unknown teacher type '{other}'"))),
        }
    }
}

/// A person's assignment to a course instance in a given role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRegistration {
    pub ssn: String,
    pub course_instance_id: CourseInstanceId,
    pub role: TeacherType,
}

impl TeacherRegistration {
    pub fn new(
        ssn: impl Into<String>,
        course_instance_id: CourseInstanceId,
        role: TeacherType,
    ) -> Self {
        Self {
            ssn: ssn.into(),
            course_instance_id,
            role,
        }
    }

    pub fn is_main(&self) -> bool {
        self.role == TeacherType::MainTeacher
    }
}

impl Entity for Person {
    const COLLECTION: &'static str = "persons";

    fn key(&self) -> String {
        self.ssn.clone()
    }
}

impl Entity for CourseTemplate {
    const COLLECTION: &'static str = "course_templates";

    fn key(&self) -> String {
        self.course_id.clone()
    }
}

impl Entity for CourseInstance {
    const COLLECTION: &'static str = "course_instances";

    fn key(&self) -> String {
        instance_key(self.id)
    }
}

impl Entity for TeacherRegistration {
    const COLLECTION: &'static str = "teacher_registrations";

    // Checks in the service never allow two rows with the same role for a
    // (person, instance) pair, so role completes the key.
    fn key(&self) -> String {
        format!(
            "{}/{}/{}",
            instance_key(self.course_instance_id),
            self.ssn,
            self.role
        )
    }
}

/// Zero-padded so byte order matches numeric order for non-negative ids.
fn instance_key(id: CourseInstanceId) -> String {
    format!("{id:020}")
}
