use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use thiserror::Error;
use url::Url;

use super::models::{ConfigMetadata, KioskConfig};
use crate::commands::DEFAULT_COMMAND_PREFIX;
use super::sources::{
    ENV_ALLOW_DUPLICATES, ENV_AUTO_SUBMIT, ENV_ORIGIN, ENV_PRECHECK_URL, EnvConfig, FileConfig,
    parse_bool,
};

static DEFAULT_CONFIG_LOCATIONS: LazyLock<Vec<PathBuf>> = LazyLock::new(|| {
    vec![
        PathBuf::from("doorscan.toml"),
        PathBuf::from("config/doorscan.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Loaded configuration plus anything worth telling the operator about it.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: KioskConfig,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Reads `.env`, the TOML file and the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Same as [`ConfigLoader::load`] with explicit environment overrides and
    /// no `.env` handling.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = Vec::new();
        let (file, config_path) = self.load_file_config(&env)?;
        if config_path.is_none() {
            warnings.push(
                "No doorscan.toml detected; using environment variables and defaults"
                    .to_string(),
            );
        }

        let config = compose(file.unwrap_or_default(), env, config_path)?;
        warnings.extend(validate(&config)?);
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (Some(path.clone()), true),
            (None, None) => (
                DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .find(|candidate| candidate.exists())
                    .cloned(),
                false,
            ),
        };

        let Some(path) = path else {
            return Ok((None, None));
        };
        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file = read_file_config(&path)?;
        Ok((Some(file), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose(
    file: FileConfig,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<KioskConfig, ConfigLoadError> {
    let FileConfig {
        log_filter,
        origin,
        mut scanner,
        precheck,
        forms,
        command_prefix,
    } = file;

    let origin = match env.origin {
        Some(raw) => Some(parse_url(ENV_ORIGIN, &raw)?),
        None => origin,
    };

    if let Some(raw) = env.precheck_url {
        scanner.precheck_url = Some(parse_url(ENV_PRECHECK_URL, &raw)?);
    }
    if let Some(form_id) = env.form_id {
        scanner.form_id = Some(form_id);
    }
    if let Some(raw) = env.auto_submit {
        scanner.auto_submit = parse_flag(ENV_AUTO_SUBMIT, &raw)?;
    }
    if let Some(raw) = env.allow_duplicates {
        scanner.allow_duplicates = parse_flag(ENV_ALLOW_DUPLICATES, &raw)?;
    }

    Ok(KioskConfig {
        log_filter: env
            .log_filter
            .or(log_filter)
            .unwrap_or_else(|| "info".to_string()),
        origin,
        scanner,
        precheck_token: env.precheck_token.or(precheck.auth_token),
        forms,
        command_prefix: env
            .command_prefix
            .or(command_prefix)
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string()),
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    })
}

/// Cross-field checks, run again after command-line flags are applied.
pub fn validate(config: &KioskConfig) -> Result<Vec<String>, ConfigLoadError> {
    let scanner = &config.scanner;
    if let Some(form_id) = scanner.submit_target()
        && !config.forms.contains_key(form_id)
    {
        return Err(ConfigLoadError::UnknownForm {
            form_id: form_id.to_string(),
        });
    }

    let prefix = &config.command_prefix;
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(ConfigLoadError::InvalidValue {
            key: "command_prefix",
            value: prefix.clone(),
            reason: "must be non-empty and contain no whitespace".to_string(),
        });
    }

    let mut warnings = Vec::new();
    if scanner.precheck_url.is_some() && !scanner.precheck_enabled() {
        warnings.push(
            "precheck_url is set but auto-submit has no form; precheck stays off".to_string(),
        );
    }
    if scanner.auto_submit && scanner.form_id.is_none() {
        warnings.push("auto_submit is on but no form_id is configured".to_string());
    }
    Ok(warnings)
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigLoadError> {
    raw.trim()
        .parse()
        .map_err(|err: url::ParseError| ConfigLoadError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigLoadError> {
    parse_bool(raw).ok_or_else(|| ConfigLoadError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: "expected true/false, yes/no, on/off or 1/0".to_string(),
    })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Env(#[from] dotenvy::Error),
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("auto-submit form '{form_id}' has no [forms.{form_id}] entry")]
    UnknownForm { form_id: String },
}
