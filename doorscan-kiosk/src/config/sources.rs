use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use doorscan_core::ScannerOptions;
use serde::Deserialize;
use url::Url;

use super::models::FormTarget;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    pub log_filter: Option<String>,
    pub origin: Option<Url>,
    #[serde(default)]
    pub scanner: ScannerOptions,
    #[serde(default)]
    pub precheck: FilePrecheckConfig,
    #[serde(default)]
    pub forms: BTreeMap<String, FormTarget>,
    pub command_prefix: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilePrecheckConfig {
    pub auth_token: Option<String>,
}

/// Environment-derived configuration values, kept raw until composition so
/// bad values can be reported with their variable name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub origin: Option<String>,
    pub precheck_url: Option<String>,
    pub precheck_token: Option<String>,
    pub form_id: Option<String>,
    pub auto_submit: Option<String>,
    pub allow_duplicates: Option<String>,
    pub command_prefix: Option<String>,
}

pub const ENV_CONFIG: &str = "DOORSCAN_CONFIG";
pub const ENV_LOG: &str = "DOORSCAN_LOG";
pub const ENV_ORIGIN: &str = "DOORSCAN_ORIGIN";
pub const ENV_PRECHECK_URL: &str = "DOORSCAN_PRECHECK_URL";
pub const ENV_PRECHECK_TOKEN: &str = "DOORSCAN_PRECHECK_TOKEN";
pub const ENV_FORM_ID: &str = "DOORSCAN_FORM_ID";
pub const ENV_AUTO_SUBMIT: &str = "DOORSCAN_AUTO_SUBMIT";
pub const ENV_ALLOW_DUPLICATES: &str = "DOORSCAN_ALLOW_DUPLICATES";
pub const ENV_COMMAND_PREFIX: &str = "DOORSCAN_COMMAND_PREFIX";

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Builds the overrides from an explicit variable list. Blank values
    /// count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        let mut take = |name: &str| vars.remove(name);

        Self {
            config_path: take(ENV_CONFIG).map(PathBuf::from),
            log_filter: take(ENV_LOG),
            origin: take(ENV_ORIGIN),
            precheck_url: take(ENV_PRECHECK_URL),
            precheck_token: take(ENV_PRECHECK_TOKEN),
            form_id: take(ENV_FORM_ID),
            auto_submit: take(ENV_AUTO_SUBMIT),
            allow_duplicates: take(ENV_ALLOW_DUPLICATES),
            command_prefix: take(ENV_COMMAND_PREFIX),
        }
    }
}

/// Parse a boolean value from a raw string, accepting common env-style forms.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_only_doorscan_variables() {
        let env = EnvConfig::from_vars([
            ("DOORSCAN_FORM_ID", "checkin"),
            ("DOORSCAN_AUTO_SUBMIT", "yes"),
            ("DOORSCAN_LOG", "   "),
            ("HOME", "/root"),
        ]);
        assert_eq!(env.form_id.as_deref(), Some("checkin"));
        assert_eq!(env.auto_submit.as_deref(), Some("yes"));
        assert_eq!(env.log_filter, None);
        assert_eq!(env.config_path, None);
    }

    #[test]
    fn bool_forms() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn scanner_table_uses_option_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            [scanner]
            auto_submit = true
            form_id = "checkin"

            [forms.checkin]
            action = "https://door.example.com/ingressi/staff/scan"
            "#,
        )
        .unwrap();
        assert_eq!(file.scanner.result_field_id, "qr-result");
        assert_eq!(file.scanner.precheck_method, "POST");
        assert_eq!(file.forms["checkin"].method, "POST");
        assert!(file.precheck.auth_token.is_none());
    }
}
