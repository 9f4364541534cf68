use payrelay::{IssuedToken, PaymentDetails, RelayError, TokenizationProvider};
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};
use std::sync::LazyLock;

const LATENCY_BUCKETS: [f64; 9] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

pub static TOKENIZE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "payrelay_tokenize_total",
        "Tokenization requests by result",
        &["result"]
    )
    .unwrap()
});

pub static TOKENIZE_LATENCY: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "payrelay_tokenize_duration_seconds",
        "End-to-end tokenization latency including the CRM update",
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap()
});

pub static PROVIDER_LATENCY: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "payrelay_provider_latency_seconds",
        "Latency of the tokenization provider call",
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap()
});

pub static CRM_UPDATES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "payrelay_crm_updates_total",
        "CRM lead updates by result",
        &["result"]
    )
    .unwrap()
});

/// Register every metric at startup so `/metrics` lists them before traffic.
pub fn register_metrics() {
    for result in ["success", "invalid", "rejected", "error"] {
        TOKENIZE_REQUESTS.with_label_values(&[result]);
    }
    for result in ["updated", "skipped", "failed"] {
        CRM_UPDATES.with_label_values(&[result]);
    }
    LazyLock::force(&TOKENIZE_LATENCY);
    LazyLock::force(&PROVIDER_LATENCY);
}

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records [`PROVIDER_LATENCY`] around every call to the wrapped provider.
#[derive(Debug, Clone)]
pub struct InstrumentedProvider<P>(pub P);

impl<P: TokenizationProvider> TokenizationProvider for InstrumentedProvider<P> {
    async fn tokenize(&self, details: &PaymentDetails) -> Result<IssuedToken, RelayError> {
        let timer = PROVIDER_LATENCY.start_timer();
        let result = self.0.tokenize(details).await;
        timer.observe_duration();
        result
    }

    fn is_test_mode(&self) -> bool {
        self.0.is_test_mode()
    }
}
