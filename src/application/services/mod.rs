//! Service layer orchestrating domain rules over the data store contract.

mod course_service;
mod provisioning;

pub use course_service::{CourseService, Repository, ServiceConfig, UnitOfWork, DEFAULT_SEMESTER};
pub use provisioning::import_catalog;
