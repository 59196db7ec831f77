//! Domain layer: course catalogue entities and registration rules.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{
    codes, CourseInstance, CourseInstanceId, CourseTemplate, Entity, Person, TeacherRegistration,
    TeacherType,
};
