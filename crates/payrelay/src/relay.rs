//! Tokenize-then-annotate orchestration.

use crate::crm::{log_failed_update, CrmClient, CrmUpdate};
use crate::error::RelayError;
use crate::payment::{CrmUpdatePayload, TokenizationRequest};
use crate::provider::TokenizationProvider;

/// What happened to the CRM side effect. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmStatus {
    Updated,
    Skipped,
    Failed,
}

impl CrmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrmStatus::Updated => "updated",
            CrmStatus::Skipped => "skipped",
            CrmStatus::Failed => "failed",
        }
    }
}

/// Successful tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizationOutcome {
    pub token: String,
    pub message: String,
    pub test_mode: bool,
    pub crm: CrmStatus,
}

/// Sends payment details to the provider and, on success, records the token
/// on the CRM lead.
///
/// The two calls are strictly sequential. A CRM failure is logged with
/// enough context to replay it and never changes the result.
#[derive(Debug, Clone)]
pub struct PaymentRelay<P, C> {
    provider: P,
    crm: C,
}

impl<P: TokenizationProvider, C: CrmClient> PaymentRelay<P, C> {
    pub fn new(provider: P, crm: C) -> Self {
        Self { provider, crm }
    }

    pub async fn tokenize(
        &self,
        request: TokenizationRequest,
    ) -> Result<TokenizationOutcome, RelayError> {
        let TokenizationRequest {
            contact_id,
            details,
        } = request;
        let test_mode = self.provider.is_test_mode();

        tracing::info!(
            contact_id = %contact_id,
            kind = %details.kind(),
            test_mode,
            "tokenization request received"
        );

        let issued = match self.provider.tokenize(&details).await {
            Ok(issued) => issued,
            Err(e) => {
                tracing::error!(contact_id = %contact_id, error = %e, "tokenization failed");
                return Err(e);
            }
        };

        tracing::info!(contact_id = %contact_id, outcome = "SUCCESS", "tokenization successful");

        let payload = CrmUpdatePayload::new(&issued.token, &details);
        let crm = match self.crm.update_contact(&contact_id, &payload).await {
            Ok(CrmUpdate::Updated { .. }) => CrmStatus::Updated,
            Ok(CrmUpdate::Skipped { reason }) => {
                tracing::info!(contact_id = %contact_id, reason = %reason, "CRM update skipped");
                CrmStatus::Skipped
            }
            Err(e) => {
                log_failed_update(&contact_id, &payload, &e);
                tracing::warn!(
                    contact_id = %contact_id,
                    error = %e,
                    "CRM update failed, but tokenization succeeded"
                );
                CrmStatus::Failed
            }
        };

        tracing::info!(contact_id = %contact_id, crm = crm.as_str(), "tokenization request completed");

        Ok(TokenizationOutcome {
            token: issued.token,
            message: issued.message,
            test_mode,
            crm,
        })
    }
}
