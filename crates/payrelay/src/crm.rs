//! CRM seam and the DialedIn lead update client.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::constants::CRM_TIMEOUT;
use crate::error::CrmError;
use crate::payment::CrmUpdatePayload;

/// Result of a CRM update that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmUpdate {
    /// The CRM accepted the update; `response` is its raw reply.
    Updated { response: String },
    /// No call was made.
    Skipped { reason: String },
}

/// Annotates a CRM lead with payment metadata.
pub trait CrmClient: Send + Sync {
    fn update_contact(
        &self,
        contact_id: &str,
        payload: &CrmUpdatePayload,
    ) -> impl std::future::Future<Output = Result<CrmUpdate, CrmError>> + Send;
}

#[derive(Clone)]
pub struct CrmCredentials {
    pub token: String,
    pub account_id: String,
}

impl fmt::Debug for CrmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmCredentials")
            .field("token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Client for the DialedIn `UpdateLead` HTTP import API.
#[derive(Debug, Clone)]
pub struct DialedInClient {
    http: reqwest::Client,
    credentials: Option<CrmCredentials>,
    endpoint: String,
    timeout: Duration,
}

impl DialedInClient {
    /// Without credentials every update is skipped.
    pub fn new(
        http: reqwest::Client,
        credentials: Option<CrmCredentials>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoint: endpoint.into(),
            timeout: CRM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

impl CrmClient for DialedInClient {
    async fn update_contact(
        &self,
        contact_id: &str,
        payload: &CrmUpdatePayload,
    ) -> Result<CrmUpdate, CrmError> {
        let Some(credentials) = &self.credentials else {
            tracing::warn!(contact_id = %contact_id, "missing DialedIn credentials, skipping update");
            return Ok(CrmUpdate::Skipped {
                reason: "Missing DialedIn credentials".to_string(),
            });
        };

        let url = lead_update_url(&self.endpoint, credentials, contact_id, payload)?;

        tracing::info!(contact_id = %contact_id, "updating DialedIn contact");

        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CrmError::Timeout(self.timeout)
                } else {
                    CrmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CrmError::Timeout(self.timeout)
            } else {
                CrmError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(CrmError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(contact_id = %contact_id, outcome = "SUCCESS", "DialedIn update successful");
        Ok(CrmUpdate::Updated { response: body })
    }
}

/// Build the `UpdateLead` URL. Parameter order follows the DialedIn docs.
pub fn lead_update_url(
    endpoint: &str,
    credentials: &CrmCredentials,
    contact_id: &str,
    payload: &CrmUpdatePayload,
) -> Result<Url, CrmError> {
    Url::parse_with_params(
        endpoint,
        &[
            ("token", credentials.token.as_str()),
            ("accid", credentials.account_id.as_str()),
            ("SearchField", "LeadId"),
            ("Identifier", contact_id),
            ("adv_PayGUID", payload.pay_guid.as_str()),
            ("adv_PayType", payload.pay_type.as_str()),
            ("adv_Last4", payload.last4.as_str()),
            ("adv_EXMO", payload.exp_month.as_str()),
            ("adv_EXYR", payload.exp_year.as_str()),
        ],
    )
    .map_err(|e| CrmError::Transport(format!("invalid DialedIn endpoint {endpoint}: {e}")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailedUpdateEntry<'a> {
    timestamp: String,
    contact_id: &'a str,
    token_data: &'a CrmUpdatePayload,
    error: String,
}

/// Emit a `failed_update` record with everything needed to replay the update by hand.
pub fn log_failed_update(contact_id: &str, payload: &CrmUpdatePayload, error: &CrmError) {
    let entry = FailedUpdateEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        contact_id,
        token_data: payload,
        error: error.to_string(),
    };

    match serde_json::to_string(&entry) {
        Ok(record) => tracing::error!(target: "failed_update", record = %record, "CRM update failed"),
        Err(e) => tracing::error!(
            target: "failed_update",
            contact_id = %contact_id,
            error = %error,
            serialize_error = %e,
            "CRM update failed"
        ),
    }
}
