use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use office_engine::{
    resolve_app_paths, FileLayoutSource, HttpLayoutSource, JsonLinesSink, LayoutStore, Roster,
    RosterError, RunnerConfig, SimulationConfig, SimulationSetup, StartupError, StopHandle,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LAYOUT_ENV_VAR: &str = "BANQUITO_LAYOUT";
const ROSTER_ENV_VAR: &str = "BANQUITO_ROSTER";
const SEED_ENV_VAR: &str = "BANQUITO_SEED";
const SOUND_ENV_VAR: &str = "BANQUITO_SOUND";
const RUN_MS_ENV_VAR: &str = "BANQUITO_RUN_MS";
const SETTLE_MS_ENV_VAR: &str = "BANQUITO_SETTLE_MS";
const SPRITE_DUMP_ENV_VAR: &str = "BANQUITO_SPRITE_DUMP";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to read roster file {path}: {source}")]
    ReadRoster {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("roster file {path} is invalid: {source}")]
    InvalidRoster {
        path: PathBuf,
        #[source]
        source: RosterError,
    },
}

pub(crate) enum AppWiring {
    Simulate {
        setup: SimulationSetup,
        runner: RunnerConfig,
        stop: StopHandle,
    },
    ExportSprites {
        out_dir: PathBuf,
    },
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Banquito Startup ===");

    if let Some(out_dir) = env_value(SPRITE_DUMP_ENV_VAR) {
        return Ok(AppWiring::ExportSprites {
            out_dir: PathBuf::from(out_dir),
        });
    }

    let layout_store = build_layout_store()?;
    let roster = load_roster()?;
    let config = simulation_config_from_env();
    let runner = RunnerConfig {
        max_runtime: parse_u64(RUN_MS_ENV_VAR, env_value(RUN_MS_ENV_VAR)).map(Duration::from_millis),
        ..RunnerConfig::default()
    };

    let stop = StopHandle::default();
    let sink = JsonLinesSink::new(io::stdout()).stop_on_failure(stop.clone());
    let setup = SimulationSetup::new(layout_store, sink)
        .with_roster(roster)
        .with_config(config);
    Ok(AppWiring::Simulate {
        setup,
        runner,
        stop,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LayoutOverride {
    Url(String),
    Path(PathBuf),
}

fn classify_layout_override(raw: &str) -> LayoutOverride {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        LayoutOverride::Url(raw.to_string())
    } else {
        LayoutOverride::Path(PathBuf::from(raw))
    }
}

fn build_layout_store() -> Result<LayoutStore, AppError> {
    let store = match env_value(LAYOUT_ENV_VAR).as_deref().map(classify_layout_override) {
        Some(LayoutOverride::Url(url)) => LayoutStore::new(HttpLayoutSource::new(url)),
        Some(LayoutOverride::Path(path)) => LayoutStore::new(FileLayoutSource::new(path)),
        None => {
            let app_paths = resolve_app_paths()?;
            info!(
                root = %app_paths.root.display(),
                assets_dir = %app_paths.assets_dir.display(),
                "startup"
            );
            LayoutStore::new(FileLayoutSource::new(app_paths.default_layout_path()))
        }
    };
    info!(source = %store.source_description(), "layout_source_selected");
    Ok(store)
}

fn load_roster() -> Result<Roster, AppError> {
    let Some(raw_path) = env_value(ROSTER_ENV_VAR) else {
        return Ok(Roster::bank_staff());
    };
    let path = PathBuf::from(raw_path);
    let raw = fs::read_to_string(&path).map_err(|source| AppError::ReadRoster {
        path: path.clone(),
        source,
    })?;
    let roster =
        Roster::from_json_str(&raw).map_err(|source| AppError::InvalidRoster { path, source })?;
    info!(agent_count = roster.len(), "roster_loaded");
    Ok(roster)
}

fn simulation_config_from_env() -> SimulationConfig {
    let defaults = SimulationConfig::default();
    SimulationConfig {
        asset_settle_delay_ms: parse_u64(SETTLE_MS_ENV_VAR, env_value(SETTLE_MS_ENV_VAR))
            .unwrap_or(defaults.asset_settle_delay_ms),
        sound_enabled: parse_flag(SOUND_ENV_VAR, env_value(SOUND_ENV_VAR))
            .unwrap_or(defaults.sound_enabled),
        rng_seed: parse_u64(SEED_ENV_VAR, env_value(SEED_ENV_VAR)),
        ..defaults
    }
}

fn env_value(var: &'static str) -> Option<String> {
    match env::var(var) {
        Ok(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(env_var = var, error = %err, "unable to read env var; using default");
            None
        }
    }
}

fn parse_u64(var: &'static str, raw: Option<String>) -> Option<u64> {
    let value = raw?;
    match value.parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(
                env_var = var,
                value = value.as_str(),
                "invalid numeric env var value; using default"
            );
            None
        }
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Option<bool> {
    let value = raw?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => {
            warn!(
                env_var = var,
                value = value.as_str(),
                "invalid flag env var value; using default"
            );
            None
        }
    }
}
