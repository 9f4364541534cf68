use std::sync::Arc;

use payrelay::{DialedInClient, MockTokenizer, NuveiClient, PaymentRelay, TokenizerBackend};

use crate::config::RelayConfig;
use crate::metrics::InstrumentedProvider;

/// Relay wired to the live provider/CRM clients.
pub type LiveRelay = PaymentRelay<InstrumentedProvider<TokenizerBackend>, DialedInClient>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub relay: Arc<LiveRelay>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(config, http_client))
    }

    /// Per-call timeouts are set by the clients, not on `http_client`.
    pub fn with_client(config: RelayConfig, http_client: reqwest::Client) -> Self {
        let provider = match config.provider_credentials() {
            Some(credentials) => {
                let client =
                    NuveiClient::new(http_client.clone(), credentials, config.nuvei_url.clone());
                tracing::info!(endpoint = %client.endpoint(), "using Nuvei tokenization API");
                TokenizerBackend::Nuvei(client)
            }
            None => {
                tracing::info!("using mock tokenization (missing Nuvei credentials)");
                TokenizerBackend::Mock(MockTokenizer::new())
            }
        };

        let crm = DialedInClient::new(
            http_client,
            config.crm_credentials(),
            config.dialedin_url.clone(),
        );
        if !crm.is_configured() {
            tracing::warn!("DialedIn credentials missing, CRM updates will be skipped");
        }

        Self {
            config: Arc::new(config),
            relay: Arc::new(PaymentRelay::new(InstrumentedProvider(provider), crm)),
        }
    }
}
