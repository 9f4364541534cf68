//! Payment method tokenization relay.
//!
//! Accepts card or ACH details, exchanges them for a Nuvei token, and writes
//! the token with masked metadata onto a DialedIn lead.
//!
//! - [`TokenizationRequest`]: validated inbound request
//! - [`TokenizationProvider`]: [`NuveiClient`] or [`MockTokenizer`]
//! - [`CrmClient`]: [`DialedInClient`]
//! - [`PaymentRelay`]: runs the two calls in order
//!
//! The CRM step is best-effort: once a token is issued it is returned to the
//! caller even if the lead update fails.

pub mod checksum;
pub mod constants;
pub mod crm;
pub mod error;
pub mod mock;
pub mod payment;
pub mod provider;
pub mod relay;

pub use checksum::compute_checksum;
pub use constants::*;
pub use crm::{CrmClient, CrmCredentials, CrmUpdate, DialedInClient};
pub use error::{CrmError, RelayError, INVALID_TYPE_MESSAGE, MISSING_FIELDS_MESSAGE};
pub use mock::MockTokenizer;
pub use payment::*;
pub use provider::{
    IssuedToken, NuveiClient, ProviderCredentials, TokenizationProvider, TokenizerBackend,
};
pub use relay::{CrmStatus, PaymentRelay, TokenizationOutcome};
