use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, info, warn};

use crate::{
    application::dtos::{AddTeacherRequest, CourseInstanceDto, PersonDto},
    domain::{
        codes, CourseInstance, CourseInstanceId, CourseTemplate, DomainError, Person,
        TeacherRegistration, TeacherType,
    },
};

/// Semester listed when the caller does not name one.
pub const DEFAULT_SEMESTER: &str = "20153";

/// Configuration shared by the service and its callers.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_semester: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_semester: DEFAULT_SEMESTER.into(),
        }
    }
}

impl ServiceConfig {
    pub fn new(default_semester: impl Into<String>) -> Self {
        let default_semester = default_semester.into();
        if default_semester.trim().is_empty() {
            return Self::default();
        }
        Self {
            default_semester: default_semester.trim().to_string(),
        }
    }

    pub fn default_semester(&self) -> &str {
        &self.default_semester
    }
}

/// Collection of one entity kind inside the data store.
pub trait Repository<T>: Send + Sync {
    /// Snapshot of every committed record, in store order.
    fn all(&self) -> Result<Vec<T>, DomainError>;

    /// Stage a record for insertion on the next `UnitOfWork::save`.
    fn add(&self, item: T) -> Result<(), DomainError>;
}

/// Contract for the data store backing the registry.
pub trait UnitOfWork: Send + Sync {
    fn persons(&self) -> &dyn Repository<Person>;

    fn course_templates(&self) -> &dyn Repository<CourseTemplate>;

    fn course_instances(&self) -> &dyn Repository<CourseInstance>;

    fn teacher_registrations(&self) -> &dyn Repository<TeacherRegistration>;

    /// Commit every staged record. All-or-nothing: on error nothing staged
    /// becomes visible.
    fn save(&self) -> Result<(), DomainError>;
}

/// Stateless façade enforcing teacher-registration rules over the store.
pub struct CourseService {
    store: Arc<dyn UnitOfWork>,
    config: ServiceConfig,
}

impl CourseService {
    pub fn new(store: Arc<dyn UnitOfWork>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Registers a person as teacher on a course instance.
    ///
    /// Checks run in order and the first failure wins: the instance must
    /// exist, the person must exist, a course holds at most one main teacher,
    /// and a person already on the course cannot be added again as assistant.
    pub fn assign_teacher(
        &self,
        course_instance_id: CourseInstanceId,
        request: AddTeacherRequest,
    ) -> Result<PersonDto, DomainError> {
        debug!(
            target: "course_registry::service",
            course_instance_id,
            ssn = %request.ssn,
            role = %request.role,
            "assigning teacher"
        );

        let course_exists = self
            .store
            .course_instances()
            .all()?
            .iter()
            .any(|instance| instance.id == course_instance_id);
        if !course_exists {
            warn!(target: "course_registry::service", course_instance_id, "course instance not found");
            return Err(DomainError::not_found(format!(
                "course instance {course_instance_id}"
            )));
        }

        let person = self
            .store
            .persons()
            .all()?
            .into_iter()
            .find(|person| person.ssn == request.ssn)
            .ok_or_else(|| {
                warn!(target: "course_registry::service", ssn = %request.ssn, "person not found");
                DomainError::not_found(format!("person {}", request.ssn))
            })?;

        let registrations: Vec<TeacherRegistration> = self
            .store
            .teacher_registrations()
            .all()?
            .into_iter()
            .filter(|registration| registration.course_instance_id == course_instance_id)
            .collect();

        if request.role == TeacherType::MainTeacher
            && registrations.iter().any(TeacherRegistration::is_main)
        {
            return Err(Self::reject(
                course_instance_id,
                codes::COURSE_ALREADY_HAS_A_MAIN_TEACHER,
            ));
        }

        // Only assistant requests are blocked here; a main-teacher request for
        // someone already registered as assistant falls through to insert.
        if request.role == TeacherType::AssistantTeacher
            && registrations
                .iter()
                .any(|registration| registration.ssn == request.ssn)
        {
            return Err(Self::reject(
                course_instance_id,
                codes::PERSON_ALREADY_REGISTERED_TEACHER_IN_COURSE,
            ));
        }

        self.store.teacher_registrations().add(TeacherRegistration::new(
            person.ssn.clone(),
            course_instance_id,
            request.role,
        ))?;
        self.store.save()?;

        info!(
            target: "course_registry::service",
            course_instance_id,
            ssn = %person.ssn,
            role = %request.role,
            "teacher registered"
        );

        Ok(PersonDto::from(&person))
    }

    /// Lists course instances of a semester with template name and main teacher.
    ///
    /// `None` or an empty token falls back to the configured default semester;
    /// any other token is matched exactly.
    pub fn course_instances_for_semester(
        &self,
        semester: Option<&str>,
    ) -> Result<Vec<CourseInstanceDto>, DomainError> {
        let semester = self.resolve_semester(semester);

        let instances: Vec<CourseInstance> = self
            .store
            .course_instances()
            .all()?
            .into_iter()
            .filter(|instance| instance.semester == semester)
            .collect();
        if instances.is_empty() {
            debug!(target: "course_registry::service", semester, "no course instances");
            return Ok(Vec::new());
        }

        let templates: AHashMap<String, CourseTemplate> = self
            .store
            .course_templates()
            .all()?
            .into_iter()
            .map(|template| (template.course_id.clone(), template))
            .collect();

        let main_teachers: AHashMap<CourseInstanceId, String> = self
            .store
            .teacher_registrations()
            .all()?
            .into_iter()
            .filter(TeacherRegistration::is_main)
            .map(|registration| (registration.course_instance_id, registration.ssn))
            .collect();

        let names: AHashMap<String, String> = self
            .store
            .persons()
            .all()?
            .into_iter()
            .map(|person| (person.ssn, person.name))
            .collect();

        let courses: Vec<CourseInstanceDto> = instances
            .into_iter()
            .filter_map(|instance| {
                let template = templates.get(&instance.course_id)?;
                let main_teacher = main_teachers
                    .get(&instance.id)
                    .and_then(|ssn| names.get(ssn))
                    .cloned()
                    .unwrap_or_default();

                Some(CourseInstanceDto {
                    name: template.name.clone(),
                    template_id: template.course_id.clone(),
                    course_instance_id: instance.id,
                    main_teacher,
                })
            })
            .collect();

        debug!(
            target: "course_registry::service",
            semester,
            count = courses.len(),
            "listed course instances"
        );

        Ok(courses)
    }

    fn resolve_semester<'a>(&'a self, semester: Option<&'a str>) -> &'a str {
        match semester {
            Some(token) if !token.is_empty() => token,
            _ => self.config.default_semester(),
        }
    }

    fn reject(course_instance_id: CourseInstanceId, code: &str) -> DomainError {
        warn!(target: "course_registry::service", course_instance_id, code, "assignment rejected");
        DomainError::validation(code)
    }
}
