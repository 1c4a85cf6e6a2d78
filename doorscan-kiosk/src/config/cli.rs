use std::path::PathBuf;

use clap::Args;
use url::Url;

use super::loader::ConfigLoaderOptions;
use super::models::KioskConfig;

/// Command-line flags. These win over the file and the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct KioskArgs {
    /// Path to the TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to a `.env` file (defaults to `./.env` when present)
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    /// Origin the scanner page is served from
    #[arg(long)]
    pub origin: Option<Url>,

    /// Precheck endpoint consulted before each check-in
    #[arg(long)]
    pub precheck_url: Option<Url>,

    /// Form submitted after an accepted scan
    #[arg(long)]
    pub form_id: Option<String>,

    /// Submit the form automatically after an accepted scan
    #[arg(long)]
    pub auto_submit: bool,

    /// Accept the same code repeatedly without the two second pause
    #[arg(long)]
    pub allow_duplicates: bool,

    /// Prefix marking operator commands in terminal input
    #[arg(long, value_name = "PREFIX")]
    pub command_prefix: Option<String>,
}

impl KioskArgs {
    pub fn loader_options(&self) -> ConfigLoaderOptions {
        ConfigLoaderOptions {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
        }
    }

    /// Applies the flags that were given. Boolean switches only turn things on.
    pub fn apply(&self, config: &mut KioskConfig) {
        if let Some(log) = &self.log {
            config.log_filter = log.clone();
        }
        if let Some(origin) = &self.origin {
            config.origin = Some(origin.clone());
        }
        if let Some(url) = &self.precheck_url {
            config.scanner.precheck_url = Some(url.clone());
        }
        if let Some(form_id) = &self.form_id {
            config.scanner.form_id = Some(form_id.clone());
        }
        if self.auto_submit {
            config.scanner.auto_submit = true;
        }
        if self.allow_duplicates {
            config.scanner.allow_duplicates = true;
        }
        if let Some(prefix) = &self.command_prefix {
            config.command_prefix = prefix.clone();
        }
    }
}
