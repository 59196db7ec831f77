use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::json;

use crate::{
    application::{import_catalog, AddTeacherRequest, CatalogFixture},
    domain::{CourseInstanceId, TeacherType},
    AppHandles,
};

pub const USAGE: &str = "\
usage: course-registry <command>

commands:
  list [semester]                          list course instances of a semester
  assign <course-instance-id> <ssn> <role> register a teacher (role: main | assistant)
  import <fixture.json>                    provision persons, templates and instances
  config show                              print the data directory and active configuration
  config set-semester <token>              change the semester listed by default

environment:
  COURSE_REGISTRY_DATA_DIR  override the data directory
  COURSE_REGISTRY_LOG       log filter (trace, debug, info, warn, error)";

/// Operator command parsed from process arguments.
#[derive(Debug, Clone)]
pub enum Command {
    List {
        semester: Option<String>,
    },
    Assign {
        course_instance_id: CourseInstanceId,
        request: AddTeacherRequest,
    },
    Import {
        path: PathBuf,
    },
    ShowConfig,
    SetSemester {
        semester: String,
    },
    Help,
}

impl Command {
    /// Parses arguments with the program name already stripped.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            return Ok(Command::Help);
        };
        let rest: Vec<String> = args.collect();

        match (name.as_str(), rest.as_slice()) {
            ("list", []) => Ok(Command::List { semester: None }),
            ("list", [semester]) => Ok(Command::List {
                semester: Some(semester.clone()),
            }),
            ("assign", [id, ssn, role]) => {
                let course_instance_id: CourseInstanceId = id
                    .parse()
                    .with_context(|| format!("invalid course instance id '{id}'"))?;
                let role: TeacherType = role.parse()?;
                Ok(Command::Assign {
                    course_instance_id,
                    request: AddTeacherRequest::new(ssn.clone(), role),
                })
            }
            ("import", [path]) => Ok(Command::Import {
                path: PathBuf::from(path),
            }),
            ("config", [sub]) if sub == "show" => Ok(Command::ShowConfig),
            ("config", [sub, semester]) if sub == "set-semester" => Ok(Command::SetSemester {
                semester: semester.clone(),
            }),
            ("help" | "-h" | "--help", _) => Ok(Command::Help),
            (other, _) => bail!("unrecognised arguments for '{other}'\n\n{USAGE}"),
        }
    }
}

/// Runs `command` against the bootstrapped environment, returning the text to print.
pub fn execute(command: Command, handles: &AppHandles) -> Result<String> {
    match command {
        Command::List { semester } => {
            let courses = handles
                .service
                .course_instances_for_semester(semester.as_deref())?;
            Ok(serde_json::to_string_pretty(&courses)?)
        }
        Command::Assign {
            course_instance_id,
            request,
        } => {
            let person = handles.service.assign_teacher(course_instance_id, request)?;
            Ok(serde_json::to_string_pretty(&person)?)
        }
        Command::Import { path } => {
            let raw = std::fs::read(&path)
                .with_context(|| format!("failed to read fixture {}", path.display()))?;
            let fixture: CatalogFixture =
                serde_json::from_slice(&raw).context("failed to parse fixture")?;
            let summary = import_catalog(handles.store.as_ref(), fixture)?;
            Ok(serde_json::to_string_pretty(&summary)?)
        }
        Command::ShowConfig => Ok(serde_json::to_string_pretty(&json!({
            "data_dir": handles.data_dir.display().to_string(),
            "config": handles.config.current(),
        }))?),
        Command::SetSemester { semester } => {
            let updated = handles
                .config
                .set_default_semester(semester)
                .context("failed to update configuration")?;
            Ok(serde_json::to_string_pretty(&updated)?)
        }
        Command::Help => Ok(USAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        application::{CourseService, ServiceConfig, UnitOfWork},
        infrastructure::InMemoryStore,
        settings::ConfigManager,
    };

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn memory_handles(data_dir: &std::path::Path) -> AppHandles {
        let store: Arc<dyn UnitOfWork> = Arc::new(InMemoryStore::new());
        AppHandles {
            service: Arc::new(CourseService::new(
                Arc::clone(&store),
                ServiceConfig::default(),
            )),
            store,
            config: Arc::new(ConfigManager::load(data_dir).unwrap()),
            data_dir: data_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert!(matches!(
            Command::parse(args(&["list"])).unwrap(),
            Command::List { semester: None }
        ));
        assert!(matches!(Command::parse(args(&[])).unwrap(), Command::Help));

        match Command::parse(args(&["assign", "12", "1203735289", "main"])).unwrap() {
            Command::Assign {
                course_instance_id,
                request,
            } => {
                assert_eq!(course_instance_id, 12);
                assert_eq!(request.ssn, "1203735289");
                assert_eq!(request.role, TeacherType::MainTeacher);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse(args(&["assign", "x", "1", "main"])).is_err());
        assert!(Command::parse(args(&["assign", "1", "1", "dean"])).is_err());
        assert!(Command::parse(args(&["list", "a", "b"])).is_err());
        assert!(Command::parse(args(&["drop"])).is_err());
    }

    #[test]
    fn test_import_then_assign_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let handles = memory_handles(dir.path());
        let fixture = dir.path().join("fixture.json");
        std::fs::write(
            &fixture,
            r#"{
                "persons": [{ "ssn": "1203735289", "name": "Daníel" }],
                "templates": [{ "course_id": "T-514-VEFT", "name": "Vefþjónustur" }],
                "instances": [{ "id": 1, "course_id": "T-514-VEFT", "semester": "20153" }]
            }"#,
        )
        .unwrap();

        let imported = execute(Command::Import { path: fixture }, &handles).unwrap();
        assert!(imported.contains("\"instances\": 1"));

        execute(
            Command::parse(args(&["assign", "1", "1203735289", "main"])).unwrap(),
            &handles,
        )
        .unwrap();

        let listed = execute(Command::List { semester: None }, &handles).unwrap();
        assert!(listed.contains("\"main_teacher\": \"Daníel\""));
    }

    #[test]
    fn test_config_commands_persist_default_semester() {
        let dir = tempfile::tempdir().unwrap();
        let handles = memory_handles(dir.path());

        assert!(matches!(
            Command::parse(args(&["config", "show"])).unwrap(),
            Command::ShowConfig
        ));
        assert!(Command::parse(args(&["config", "drop"])).is_err());

        let updated = execute(
            Command::parse(args(&["config", "set-semester", "20161"])).unwrap(),
            &handles,
        )
        .unwrap();
        assert!(updated.contains("\"default_semester\": \"20161\""));

        let shown = execute(Command::ShowConfig, &handles).unwrap();
        assert!(shown.contains("20161"));
        assert!(shown.contains(&handles.data_dir.display().to_string()));

        let reloaded = ConfigManager::load(dir.path()).unwrap();
        assert_eq!(reloaded.current().default_semester, "20161");

        assert!(execute(
            Command::SetSemester {
                semester: "  ".into()
            },
            &handles
        )
        .is_err());
    }

    #[test]
    fn test_assign_surfaces_domain_error() {
        let dir = tempfile::tempdir().unwrap();
        let handles = memory_handles(dir.path());

        let err = execute(
            Command::parse(args(&["assign", "1", "1203735289", "assistant"])).unwrap(),
            &handles,
        )
        .unwrap_err();

        let domain = err.downcast_ref::<crate::domain::DomainError>().unwrap();
        assert!(domain.is_not_found());
    }
}
