use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

use application::{CourseService, ServiceConfig, UnitOfWork};
use domain::DomainError;
use infrastructure::{InMemoryStore, SledStore};
use interfaces::cli::{self, Command};
use settings::{ConfigManager, StoreBackend};

const ENV_DATA_DIR: &str = "COURSE_REGISTRY_DATA_DIR";
const ENV_LOG: &str = "COURSE_REGISTRY_LOG";

/// Everything a caller needs to drive the registry.
pub struct AppHandles {
    pub service: Arc<CourseService>,
    pub store: Arc<dyn UnitOfWork>,
    pub config: Arc<ConfigManager>,
    pub data_dir: PathBuf,
}

/// Entry point invoked from `main.rs`.
pub fn run() {
    init_tracing();

    if let Err(err) = try_run() {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(code)) => eprintln!("{code}"),
            _ => eprintln!("[course-registry] {err:?}"),
        }
        std::process::exit(1);
    }
}

fn try_run() -> Result<()> {
    let command = Command::parse(std::env::args().skip(1))?;
    if matches!(command, Command::Help) {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let handles = build_environment().context("failed to bootstrap course registry")?;
    let output = cli::execute(command, &handles)?;
    println!("{output}");

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var(ENV_LOG).unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Bootstraps the registry from the resolved data directory.
pub fn build_environment() -> Result<AppHandles> {
    let data_dir = resolve_data_dir()?;
    build_environment_in(&data_dir)
}

/// Bootstraps the registry rooted at `data_dir`, opening the configured store.
pub fn build_environment_in(data_dir: &Path) -> Result<AppHandles> {
    let config = Arc::new(ConfigManager::load(data_dir).context("failed to load config file")?);
    let active_config = config.current();

    let store: Arc<dyn UnitOfWork> = match active_config.store {
        StoreBackend::Sled => {
            let store_path = data_dir.join("store");
            let store_impl = SledStore::open(&store_path)
                .map_err(|err| anyhow!(err.to_string()))
                .context("failed to open embedded store")?;
            Arc::new(store_impl)
        }
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
    };

    let service = Arc::new(CourseService::new(
        Arc::clone(&store),
        ServiceConfig::new(active_config.default_semester.clone()),
    ));

    info!(
        target: "course_registry::bootstrap",
        data_dir = %data_dir.display(),
        store = active_config.store.id(),
        default_semester = %active_config.default_semester,
        "environment ready"
    );

    Ok(AppHandles {
        service,
        store,
        config,
        data_dir: data_dir.to_path_buf(),
    })
}

fn resolve_data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(ENV_DATA_DIR) {
        Some(dir) => PathBuf::from(dir),
        None => directories::ProjectDirs::from("dev", "course-registry", "CourseRegistry")
            .ok_or_else(|| anyhow!("unable to determine OS data dir"))?
            .data_dir()
            .to_path_buf(),
    };
    std::fs::create_dir_all(&dir).context("failed to create data directory")?;
    Ok(dir)
}
