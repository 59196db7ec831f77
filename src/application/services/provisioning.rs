use tracing::info;

use crate::{
    application::{
        dtos::{CatalogFixture, ImportSummary},
        services::UnitOfWork,
    },
    domain::DomainError,
};

/// Stages every record of `fixture` and commits them together.
///
/// Persons, templates and instances are created by external provisioning; no
/// registration rule applies here beyond the store's own key uniqueness.
pub fn import_catalog(
    store: &dyn UnitOfWork,
    fixture: CatalogFixture,
) -> Result<ImportSummary, DomainError> {
    let summary = ImportSummary {
        persons: fixture.persons.len(),
        templates: fixture.templates.len(),
        instances: fixture.instances.len(),
    };

    for person in fixture.persons {
        store.persons().add(person)?;
    }
    for template in fixture.templates {
        store.course_templates().add(template)?;
    }
    for instance in fixture.instances {
        store.course_instances().add(instance)?;
    }
    store.save()?;

    info!(
        target: "course_registry::service",
        persons = summary.persons,
        templates = summary.templates,
        instances = summary.instances,
        "catalog imported"
    );

    Ok(summary)
}
