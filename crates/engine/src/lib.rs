use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod content;
pub mod layout;
pub mod protocol;
pub mod roster;
pub mod sim;
pub mod sprite;
mod sprite_keys;

pub use content::{
    export_sprite_set, floor_sprites, furniture_catalog, generate_sprite, sprite_digest_hex,
    wall_sprites, AssetCatalog, CatalogError, ExportManifest, FurnitureCatalogEntry,
    FurnitureCategory, SpriteExportError, FALLBACK_FURNITURE_ID,
};
pub use layout::{
    default_layout, FileLayoutSource, FurniturePlacement, HttpLayoutSource, LayoutLoadError,
    LayoutOrigin, LayoutSource, LayoutStore, OfficeLayout, DEFAULT_LAYOUT_RELATIVE_PATH,
};
pub use protocol::{
    ActivityToken, AgentMeta, AgentStatus, CharacterTemplate, EventLog, EventSink, JsonLinesSink,
    SceneEvent,
};
pub use roster::{Agent, AgentId, Roster, RosterError};
pub use sim::{
    run_realtime, ActivityTimings, EmissionRates, Millis, RunSummary, RunnerConfig, Simulation,
    SimulationConfig, SimulationSetup, StopHandle, StopReason,
};
pub use sprite::{Rgb, Sprite};
pub use sprite_keys::SpriteKeyError;

pub const ROOT_ENV_VAR: &str = "BANQUITO_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppPaths {
    pub fn default_layout_path(&self) -> PathBuf {
        self.root.join(DEFAULT_LAYOUT_RELATIVE_PATH)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "BANQUITO_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/banquito\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    Ok(AppPaths { root, assets_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            find_root_upward(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_upward(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
