use std::env;
use std::path::PathBuf;

use flint_host::{load_input_script, InputScript, InputScriptError, LoopConfig};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_session_config, ConfigError, SessionConfig};
use super::gameplay::SpawnerApp;

pub(crate) const SESSION_CONFIG_ENV_VAR: &str = "FLINT_SESSION_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) host: LoopConfig,
    pub(crate) app: SpawnerApp,
    pub(crate) script: InputScript,
}

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] InputScriptError),
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Flint Spawner Startup ===");

    let config = match session_config_path()? {
        Some(path) => {
            info!(path = %path.display(), "session_config_loading");
            load_session_config(&path)?
        }
        None => {
            info!(var = SESSION_CONFIG_ENV_VAR, "session_config_default");
            SessionConfig::default()
        }
    };
    wire(config)
}

fn wire(config: SessionConfig) -> Result<AppWiring, StartupError> {
    let script = match &config.script_path {
        Some(path) => load_input_script(path)?,
        None => InputScript::from_entries(config.script)?,
    };
    info!(
        inputs = script.len(),
        cadence_seconds = config.gameplay.spawner.cadence_seconds,
        capacity = config.gameplay.spawner.capacity,
        "session_wired"
    );
    Ok(AppWiring {
        host: config.host,
        app: SpawnerApp::new(config.gameplay),
        script,
    })
}

fn session_config_path() -> Result<Option<PathBuf>, StartupError> {
    match env::var(SESSION_CONFIG_ENV_VAR) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => Ok(Some(PathBuf::from(raw.trim()))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar {
            var: SESSION_CONFIG_ENV_VAR,
            source,
        }),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
