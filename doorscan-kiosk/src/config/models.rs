use std::collections::BTreeMap;
use std::path::PathBuf;

use doorscan_core::{PageContext, ScannerOptions};
use serde::Deserialize;
use url::Url;

/// Fully resolved kiosk configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Origin the kiosk pretends to be served from, for the secure-context check.
    pub origin: Option<Url>,
    pub scanner: ScannerOptions,
    /// Bearer token sent to the precheck endpoint.
    pub precheck_token: Option<String>,
    pub forms: BTreeMap<String, FormTarget>,
    /// Marks operator commands in terminal input.
    pub command_prefix: String,
    pub metadata: ConfigMetadata,
}

impl KioskConfig {
    pub fn page(&self) -> PageContext {
        match &self.origin {
            Some(origin) => PageContext::from_origin(origin.clone()),
            None => PageContext::secure(),
        }
    }
}

/// Where a form is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormTarget {
    pub action: Url,
    #[serde(default = "default_form_method")]
    pub method: String,
}

fn default_form_method() -> String {
    "POST".to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
