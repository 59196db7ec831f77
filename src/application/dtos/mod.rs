use serde::{Deserialize, Serialize};

use crate::domain::{CourseInstance, CourseInstanceId, CourseTemplate, Person, TeacherType};

/// Payload naming the person to register on a course instance and the role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTeacherRequest {
    pub ssn: String,
    #[serde(rename = "type")]
    pub role: TeacherType,
}

impl AddTeacherRequest {
    pub fn new(ssn: impl Into<String>, role: TeacherType) -> Self {
        Self {
            ssn: ssn.into(),
            role,
        }
    }
}

/// Public identity of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDto {
    pub ssn: String,
    pub name: String,
}

impl From<&Person> for PersonDto {
    fn from(value: &Person) -> Self {
        Self {
            ssn: value.ssn.clone(),
            name: value.name.clone(),
        }
    }
}

/// Listing row for a course instance, joined with its template and main teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInstanceDto {
    pub name: String,
    pub template_id: String,
    pub course_instance_id: CourseInstanceId,
    /// Name of the main teacher, empty when none is registered.
    pub main_teacher: String,
}

/// Catalogue records provisioned from outside the service in a single commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFixture {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub templates: Vec<CourseTemplate>,
    #[serde(default)]
    pub instances: Vec<CourseInstance>,
}

/// Counts of records written by a catalogue import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub persons: usize,
    pub templates: usize,
    pub instances: usize,
}
