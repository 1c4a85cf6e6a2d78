//! Scanner options supplied by the host.

use serde::Deserialize;
use url::Url;

fn default_result_field_id() -> String {
    "qr-result".to_string()
}

fn default_manual_field_id() -> String {
    "qr-manual".to_string()
}

fn default_precheck_method() -> String {
    "POST".to_string()
}

fn default_precheck_payload_key() -> String {
    "qr".to_string()
}

/// Per-scanner options, captured once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerOptions {
    /// Submit `form_id` after an accepted scan.
    pub auto_submit: bool,
    /// Form submitted after an accepted scan, and by manual submission.
    pub form_id: Option<String>,
    /// Field that receives the accepted code.
    #[serde(default = "default_result_field_id")]
    pub result_field_id: String,
    /// Manual-entry fallback field, kept in sync with the result field.
    #[serde(default = "default_manual_field_id")]
    pub manual_field_id: String,
    /// Disable the duplicate window.
    pub allow_duplicates: bool,
    /// Endpoint asked to approve each code before it is committed.
    pub precheck_url: Option<Url>,
    /// HTTP method for the precheck request.
    #[serde(default = "default_precheck_method")]
    pub precheck_method: String,
    /// JSON key carrying the decoded text in the precheck request.
    #[serde(default = "default_precheck_payload_key")]
    pub precheck_payload_key: String,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            auto_submit: false,
            form_id: None,
            result_field_id: default_result_field_id(),
            manual_field_id: default_manual_field_id(),
            allow_duplicates: false,
            precheck_url: None,
            precheck_method: default_precheck_method(),
            precheck_payload_key: default_precheck_payload_key(),
        }
    }
}

impl ScannerOptions {
    /// Auto-submit shorthand: submit `form_id` with the code in `result_field_id`.
    pub fn auto_submit_form(
        form_id: impl Into<String>,
        result_field_id: impl Into<String>,
    ) -> Self {
        Self {
            auto_submit: true,
            form_id: Some(form_id.into()),
            result_field_id: result_field_id.into(),
            ..Self::default()
        }
    }

    /// Sets the precheck endpoint.
    pub fn with_precheck(mut self, url: Url) -> Self {
        self.precheck_url = Some(url);
        self
    }

    /// Turns the duplicate window off or on.
    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Form to submit, when auto-submit is on.
    pub fn submit_target(&self) -> Option<&str> {
        if self.auto_submit {
            self.form_id.as_deref()
        } else {
            None
        }
    }

    /// The remote precheck only guards auto-submitted forms.
    pub fn precheck_enabled(&self) -> bool {
        self.precheck_url.is_some() && self.submit_target().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ScannerOptions::default();
        assert!(!options.auto_submit);
        assert_eq!(options.result_field_id, "qr-result");
        assert_eq!(options.manual_field_id, "qr-manual");
        assert_eq!(options.precheck_method, "POST");
        assert_eq!(options.precheck_payload_key, "qr");
        assert!(!options.precheck_enabled());
    }

    #[test]
    fn precheck_needs_url_auto_submit_and_form() {
        let url: Url = "https://door.example.com/precheck".parse().unwrap();

        let url_only = ScannerOptions::default().with_precheck(url.clone());
        assert!(!url_only.precheck_enabled());

        let no_form = ScannerOptions {
            auto_submit: true,
            ..ScannerOptions::default().with_precheck(url.clone())
        };
        assert!(!no_form.precheck_enabled());

        let full = ScannerOptions::auto_submit_form("checkin", "qr-result")
            .with_precheck(url);
        assert!(full.precheck_enabled());
    }

    #[test]
    fn form_without_auto_submit_is_not_a_target() {
        let options = ScannerOptions {
            form_id: Some("checkin".into()),
            ..ScannerOptions::default()
        };
        assert_eq!(options.submit_target(), None);
    }

    #[test]
    fn deserializes_partial_tables() {
        let options: ScannerOptions = serde_json::from_str(
            r#"{"auto_submit": true, "form_id": "checkin", "precheck_url": "https://door.example.com/precheck"}"#,
        )
        .unwrap();
        assert_eq!(options.submit_target(), Some("checkin"));
        assert_eq!(options.result_field_id, "qr-result");
        assert!(options.precheck_enabled());
    }
}
