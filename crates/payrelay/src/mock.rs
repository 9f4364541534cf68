//! Synthetic tokens for deployments without Nuvei credentials.

use crate::error::RelayError;
use crate::payment::{PaymentDetails, PaymentKind};
use crate::provider::{IssuedToken, TokenizationProvider};

const RANDOM_ID_LEN: usize = 13;

pub const MOCK_TOKEN_MESSAGE: &str = "TEST MODE: Mock token generated (awaiting Nuvei credentials)";

/// Issues `card_tok_<id>_<time>` / `ach_tok_<id>_<time>` tokens without any
/// network access. Tokens are random, so identical requests get distinct tokens.
#[derive(Debug, Clone, Default)]
pub struct MockTokenizer;

impl MockTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl TokenizationProvider for MockTokenizer {
    async fn tokenize(&self, details: &PaymentDetails) -> Result<IssuedToken, RelayError> {
        let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Ok(IssuedToken {
            token: mock_token(details.kind(), &random_id(), millis),
            message: MOCK_TOKEN_MESSAGE.to_string(),
        })
    }

    fn is_test_mode(&self) -> bool {
        true
    }
}

/// Assemble a mock token from its parts.
pub fn mock_token(kind: PaymentKind, random_id: &str, unix_millis: u64) -> String {
    format!(
        "{}{}_{}",
        kind.mock_token_prefix(),
        random_id,
        to_base36(unix_millis)
    )
}

fn random_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(RANDOM_ID_LEN);
    id
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
