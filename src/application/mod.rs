//! Application layer wiring DTOs and services for the course registry.

pub mod dtos;
pub mod services;

pub use dtos::{AddTeacherRequest, CatalogFixture, CourseInstanceDto, ImportSummary, PersonDto};
pub use services::{import_catalog, CourseService, Repository, ServiceConfig, UnitOfWork};
