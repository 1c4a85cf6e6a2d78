//! Result fields and check-in form submission.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capabilities::{FieldStore, FormSubmission, FormSubmitter};
use crate::constants::AUTO_SUBMIT_DELAY;
use crate::error::SubmitError;
use crate::options::ScannerOptions;

/// Writes accepted codes into the form fields and optionally submits the form.
#[derive(Clone, Debug)]
pub struct AutoSubmitController {
    result_field_id: String,
    manual_field_id: String,
    target: Option<String>,
    form_id: Option<String>,
    fields: Arc<dyn FieldStore>,
    submitter: Option<Arc<dyn FormSubmitter>>,
}

impl AutoSubmitController {
    /// Controller over `fields`, submitting through `submitter` when given.
    pub fn new(
        options: &ScannerOptions,
        fields: Arc<dyn FieldStore>,
        submitter: Option<Arc<dyn FormSubmitter>>,
    ) -> Self {
        Self {
            result_field_id: options.result_field_id.clone(),
            manual_field_id: options.manual_field_id.clone(),
            target: options.submit_target().map(str::to_string),
            form_id: options.form_id.clone(),
            fields,
            submitter,
        }
    }

    /// Puts `code` in the result field and the manual-entry field.
    pub fn populate(&self, code: &str) {
        if !self.fields.set_value(&self.result_field_id, code) {
            warn!(target: "doorscan::submit", field = %self.result_field_id, "result field not found");
        }
        if !self.fields.set_value(&self.manual_field_id, code) {
            debug!(target: "doorscan::submit", field = %self.manual_field_id, "no manual-entry field to mirror into");
        }
    }

    /// Submits the target form after the auto-submit delay.
    ///
    /// Returns `None` when auto-submit is off or the form is unknown; the code
    /// stays in the result field for a manual submit.
    pub fn schedule_submit(&self) -> Option<JoinHandle<()>> {
        let form_id = self.target.clone()?;

        let submitter = match &self.submitter {
            Some(submitter) if submitter.has_form(&form_id) => Arc::clone(submitter),
            _ => {
                warn!(target: "doorscan::submit", form = %form_id, "auto-submit form not found");
                return None;
            }
        };

        let submission = FormSubmission {
            form_id,
            fields: self.snapshot(),
        };

        Some(tokio::spawn(async move {
            tokio::time::sleep(AUTO_SUBMIT_DELAY).await;
            info!(target: "doorscan::submit", form = %submission.form_id, "auto-submitting form");
            let form_id = submission.form_id.clone();
            if let Err(err) = submitter.submit(submission).await {
                warn!(target: "doorscan::submit", form = %form_id, error = %err, "form submission failed");
            }
        }))
    }

    /// Submits the configured form right away with the current field values.
    ///
    /// Used by manual flows; it does not depend on `auto_submit`. Returns the
    /// id of the submitted form.
    pub async fn submit_now(&self) -> Result<String, SubmitError> {
        let form_id = self
            .form_id
            .clone()
            .ok_or_else(|| SubmitError::FormNotFound("<none configured>".to_string()))?;
        let submitter = match &self.submitter {
            Some(submitter) if submitter.has_form(&form_id) => Arc::clone(submitter),
            _ => return Err(SubmitError::FormNotFound(form_id)),
        };

        info!(target: "doorscan::submit", form = %form_id, "submitting form");
        submitter
            .submit(FormSubmission {
                form_id: form_id.clone(),
                fields: self.snapshot(),
            })
            .await?;
        Ok(form_id)
    }

    /// Copies the trimmed manual-entry value into the result field. An empty
    /// manual field leaves the result field alone.
    pub fn mirror_manual_entry(&self) -> Option<String> {
        let value = self.fields.value(&self.manual_field_id)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        if self.fields.set_value(&self.result_field_id, trimmed) {
            Some(trimmed.to_string())
        } else {
            None
        }
    }

    /// Records operator typing in the manual field and mirrors it.
    pub fn enter_manually(&self, value: &str) -> Option<String> {
        if !self.fields.set_value(&self.manual_field_id, value) {
            warn!(target: "doorscan::submit", field = %self.manual_field_id, "manual-entry field not found");
            return None;
        }
        self.mirror_manual_entry()
    }

    /// Current value of the result field.
    pub fn result_value(&self) -> Option<String> {
        self.fields.value(&self.result_field_id)
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        [&self.result_field_id, &self.manual_field_id]
            .into_iter()
            .filter_map(|id| self.fields.value(id).map(|value| (id.clone(), value)))
            .collect()
    }
}
