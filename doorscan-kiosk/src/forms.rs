use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use doorscan_core::{FormSubmission, FormSubmitter, SubmitError};
use reqwest::{Client, Method};
use tracing::{info, warn};
use url::Url;

use crate::config::FormTarget;

#[derive(Debug, Clone)]
struct Endpoint {
    action: Url,
    method: Method,
}

/// Submits check-in forms as url-encoded requests to their configured action.
#[derive(Debug, Clone)]
pub struct HttpFormSubmitter {
    client: Client,
    forms: HashMap<String, Endpoint>,
    auth_token: Option<String>,
}

impl HttpFormSubmitter {
    pub fn new(forms: &BTreeMap<String, FormTarget>) -> Result<Self, SubmitError> {
        let forms = forms
            .iter()
            .map(|(id, target)| {
                let method = target.method.trim().to_ascii_uppercase();
                let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
                    SubmitError::InvalidMethod {
                        form_id: id.clone(),
                        method: target.method.clone(),
                    }
                })?;
                Ok((
                    id.clone(),
                    Endpoint {
                        action: target.action.clone(),
                        method,
                    },
                ))
            })
            .collect::<Result<HashMap<_, _>, SubmitError>>()?;

        Ok(Self {
            client: Client::builder().build()?,
            forms,
            auth_token: None,
        })
    }

    /// Bearer token sent with every submission.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[async_trait]
impl FormSubmitter for HttpFormSubmitter {
    fn has_form(&self, form_id: &str) -> bool {
        self.forms.contains_key(form_id)
    }

    async fn submit(&self, submission: FormSubmission) -> Result<(), SubmitError> {
        let endpoint = self
            .forms
            .get(&submission.form_id)
            .ok_or_else(|| SubmitError::FormNotFound(submission.form_id.clone()))?;

        let mut request = self
            .client
            .request(endpoint.method.clone(), endpoint.action.clone());
        request = if endpoint.method == Method::GET {
            request.query(&submission.fields)
        } else {
            request.form(&submission.fields)
        };
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(target: "doorscan::kiosk", form = %submission.form_id, %status, "form rejected");
            return Err(SubmitError::Rejected {
                form_id: submission.form_id,
                status: status.as_u16(),
            });
        }

        info!(target: "doorscan::kiosk", form = %submission.form_id, %status, "form submitted");
        Ok(())
    }
}
