//! Model-set path resolution.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → system path.

use std::path::{Path, PathBuf};

/// Where a model-set file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/hmm-stream/.
    SystemConfig,

    /// Nothing found.
    #[default]
    NotFound,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::NotFound => write!(f, "not found"),
        }
    }
}

/// A resolved model-set path and where it came from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPath {
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Environment variable names.
pub const ENV_MODELS_PATH: &str = "HMM_STREAM_MODELS";
pub const ENV_CONFIG_DIR: &str = "HMM_STREAM_CONFIG_DIR";

/// Standard model-set file name.
const MODELS_FILENAME: &str = "models.json";

/// Application name for XDG directories.
const APP_NAME: &str = "hmm-stream";

/// Resolve the model-set path.
///
/// Resolution order:
/// 1. Explicit CLI path (if it exists)
/// 2. HMM_STREAM_MODELS environment variable
/// 3. HMM_STREAM_CONFIG_DIR environment variable + models.json
/// 4. XDG config directory (~/.config/hmm-stream/models.json)
/// 5. System config (/etc/hmm-stream/models.json)
pub fn resolve_model_path(cli_path: Option<&Path>) -> ResolvedPath {
    // 1. CLI argument
    if let Some(path) = cli_path {
        if path.exists() {
            return found(path.to_path_buf(), ConfigSource::CliArgument);
        }
        tracing::debug!(path = %path.display(), "CLI model path does not exist, falling back");
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_MODELS_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(MODELS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(xdg_config) = dirs::config_dir() {
        let path = xdg_config.join(APP_NAME).join(MODELS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    // 5. System config
    let system_path = PathBuf::from("/etc").join(APP_NAME).join(MODELS_FILENAME);
    if system_path.exists() {
        return found(system_path, ConfigSource::SystemConfig);
    }

    ResolvedPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ResolvedPath {
    ResolvedPath {
        path: Some(path),
        source,
    }
}
