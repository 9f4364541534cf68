//! Tokenization provider seam and the Nuvei implementation.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::checksum::compute_checksum;
use crate::constants::PROVIDER_TIMEOUT;
use crate::error::RelayError;
use crate::mock::MockTokenizer;
use crate::payment::{AchData, CardData, PaymentDetails};

/// Token issued by a provider for a payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub message: String,
}

/// Exchanges raw payment details for an opaque token.
pub trait TokenizationProvider: Send + Sync {
    fn tokenize(
        &self,
        details: &PaymentDetails,
    ) -> impl std::future::Future<Output = Result<IssuedToken, RelayError>> + Send;

    /// Whether issued tokens are synthetic and cannot be charged.
    fn is_test_mode(&self) -> bool {
        false
    }
}

/// Merchant credentials for the Nuvei API.
#[derive(Clone)]
pub struct ProviderCredentials {
    pub merchant_id: String,
    pub site_id: String,
    pub secret_key: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("merchant_id", &self.merchant_id)
            .field("site_id", &self.site_id)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Body POSTed to the Nuvei tokenization endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NuveiTokenizationRequest<'a> {
    pub merchant_id: &'a str,
    pub merchant_site_id: &'a str,
    pub time_stamp: i64,
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_data: Option<&'a CardData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_data: Option<&'a AchData>,
}

impl<'a> NuveiTokenizationRequest<'a> {
    pub fn new(
        credentials: &'a ProviderCredentials,
        details: &'a PaymentDetails,
        timestamp: i64,
    ) -> Self {
        let (card_data, account_data) = match details {
            PaymentDetails::Card(card) => (Some(card), None),
            PaymentDetails::Ach(ach) => (None, Some(ach)),
        };

        Self {
            merchant_id: &credentials.merchant_id,
            merchant_site_id: &credentials.site_id,
            time_stamp: timestamp,
            checksum: compute_checksum(
                &credentials.merchant_id,
                &credentials.site_id,
                timestamp,
                &credentials.secret_key,
            ),
            card_data,
            account_data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NuveiTokenizationResponse {
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl NuveiTokenizationResponse {
    pub fn into_result(self) -> Result<IssuedToken, RelayError> {
        if self.status != "SUCCESS" {
            return Err(RelayError::Provider(
                self.reason.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        match self.token {
            Some(token) if !token.is_empty() => Ok(IssuedToken {
                token,
                message: "Payment method successfully tokenized".to_string(),
            }),
            _ => Err(RelayError::Internal(
                "Nuvei reported SUCCESS without a token".to_string(),
            )),
        }
    }
}

/// Client for the Nuvei tokenization API.
#[derive(Debug, Clone)]
pub struct NuveiClient {
    http: reqwest::Client,
    credentials: ProviderCredentials,
    endpoint: String,
    timeout: Duration,
}

impl NuveiClient {
    pub fn new(
        http: reqwest::Client,
        credentials: ProviderCredentials,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoint: endpoint.into(),
            timeout: PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, details: &PaymentDetails) -> Result<IssuedToken, RelayError> {
        let timestamp = chrono::Utc::now().timestamp();
        let body = NuveiTokenizationRequest::new(&self.credentials, details, timestamp);

        tracing::info!(endpoint = %self.endpoint, kind = %details.kind(), "calling Nuvei tokenization API");

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %text, "Nuvei returned an HTTP error");
            return Err(RelayError::Internal(format!(
                "Nuvei API returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: NuveiTokenizationResponse = response.json().await.map_err(|e| {
            RelayError::Internal(format!("failed to decode Nuvei response: {e}"))
        })?;

        parsed.into_result()
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::Internal(format!(
                "Nuvei API timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            RelayError::Internal(format!("Nuvei API request failed: {e}"))
        }
    }
}

impl TokenizationProvider for NuveiClient {
    async fn tokenize(&self, details: &PaymentDetails) -> Result<IssuedToken, RelayError> {
        let started = Instant::now();
        let result = self.send(details).await;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Nuvei call finished"
        );
        result
    }
}

/// Provider chosen at startup: real Nuvei when credentials are configured,
/// otherwise mock tokens.
#[derive(Debug, Clone)]
pub enum TokenizerBackend {
    Nuvei(NuveiClient),
    Mock(MockTokenizer),
}

impl TokenizationProvider for TokenizerBackend {
    async fn tokenize(&self, details: &PaymentDetails) -> Result<IssuedToken, RelayError> {
        match self {
            TokenizerBackend::Nuvei(client) => client.tokenize(details).await,
            TokenizerBackend::Mock(mock) => mock.tokenize(details).await,
        }
    }

    fn is_test_mode(&self) -> bool {
        match self {
            TokenizerBackend::Nuvei(client) => client.is_test_mode(),
            TokenizerBackend::Mock(mock) => mock.is_test_mode(),
        }
    }
}
