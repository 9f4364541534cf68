//! Payment method data as it arrives from the client and as it is forwarded.
//!
//! [`TokenizeBody`] is the raw JSON shape with every field optional.
//! [`TokenizationRequest::try_from`] is the only place it is validated, so
//! everything downstream works with a [`PaymentDetails`] that is already
//! known to be a well-formed card or ACH account.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Payment method kind, as sent in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Card,
    Ach,
}

impl PaymentKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "card" => Some(PaymentKind::Card),
            "ach" => Some(PaymentKind::Ach),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Card => "card",
            PaymentKind::Ach => "ach",
        }
    }

    /// `PayType` value written to the CRM lead.
    pub fn crm_pay_type(&self) -> &'static str {
        match self {
            PaymentKind::Card => "Charge Card",
            PaymentKind::Ach => "EFT",
        }
    }

    /// Prefix of test-mode tokens.
    pub fn mock_token_prefix(&self) -> &'static str {
        match self {
            PaymentKind::Card => "card_tok_",
            PaymentKind::Ach => "ach_tok_",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub card_number: String,
    pub card_holder_name: String,
    pub expiration_month: String,
    pub expiration_year: String,
    #[serde(rename = "CVV")]
    pub cvv: String,
}

impl fmt::Debug for CardData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardData")
            .field("card_number", &masked(&self.card_number))
            .field("card_holder_name", &self.card_holder_name)
            .field("expiration_month", &self.expiration_month)
            .field("expiration_year", &self.expiration_year)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchData {
    pub routing_number: String,
    pub account_number: String,
    pub account_holder_name: String,
    pub account_type: String,
}

impl fmt::Debug for AchData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AchData")
            .field("routing_number", &self.routing_number)
            .field("account_number", &masked(&self.account_number))
            .field("account_holder_name", &self.account_holder_name)
            .field("account_type", &self.account_type)
            .finish()
    }
}

/// A validated payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDetails {
    Card(CardData),
    Ach(AchData),
}

impl PaymentDetails {
    pub fn kind(&self) -> PaymentKind {
        match self {
            PaymentDetails::Card(_) => PaymentKind::Card,
            PaymentDetails::Ach(_) => PaymentKind::Ach,
        }
    }

    /// Last four characters of the card or account number.
    pub fn last4(&self) -> &str {
        match self {
            PaymentDetails::Card(card) => last4(&card.card_number),
            PaymentDetails::Ach(ach) => last4(&ach.account_number),
        }
    }
}

/// Raw inbound body of a tokenization request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeBody {
    #[serde(default)]
    pub payment_data: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<serde_json::Value>,
    /// Lead ids are numeric in the CRM, so clients send either form.
    #[serde(default)]
    pub contact_id: Option<serde_json::Value>,
}

/// A tokenization request that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizationRequest {
    pub contact_id: String,
    pub details: PaymentDetails,
}

impl TryFrom<TokenizeBody> for TokenizationRequest {
    type Error = RelayError;

    fn try_from(body: TokenizeBody) -> Result<Self, Self::Error> {
        let payment_data = body.payment_data.filter(is_present);
        let kind = body.kind.filter(is_present);
        let contact_id = body
            .contact_id
            .filter(is_present)
            .and_then(contact_id_string);

        let (Some(payment_data), Some(kind), Some(contact_id)) = (payment_data, kind, contact_id)
        else {
            return Err(RelayError::missing_fields());
        };

        let kind = kind
            .as_str()
            .and_then(PaymentKind::parse)
            .ok_or_else(RelayError::invalid_type)?;
        let details = match kind {
            PaymentKind::Card => PaymentDetails::Card(decode_payment_data(payment_data)?),
            PaymentKind::Ach => PaymentDetails::Ach(decode_payment_data(payment_data)?),
        };

        Ok(Self {
            contact_id,
            details,
        })
    }
}

/// Fields written to the CRM lead after a successful tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrmUpdatePayload {
    #[serde(rename = "PayGUID")]
    pub pay_guid: String,
    #[serde(rename = "PayType")]
    pub pay_type: String,
    #[serde(rename = "Last4")]
    pub last4: String,
    #[serde(rename = "EXMO")]
    pub exp_month: String,
    #[serde(rename = "EXYR")]
    pub exp_year: String,
}

impl CrmUpdatePayload {
    pub fn new(token: &str, details: &PaymentDetails) -> Self {
        let (exp_month, exp_year) = match details {
            PaymentDetails::Card(card) => {
                (card.expiration_month.clone(), card.expiration_year.clone())
            }
            PaymentDetails::Ach(_) => (String::new(), String::new()),
        };

        Self {
            pay_guid: token.to_string(),
            pay_type: details.kind().crm_pay_type().to_string(),
            last4: details.last4().to_string(),
            exp_month,
            exp_year,
        }
    }
}

fn decode_payment_data<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, RelayError> {
    serde_json::from_value(value)
        .map_err(|e| RelayError::Validation(format!("Invalid payment data: {e}")))
}

fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

fn contact_id_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn last4(number: &str) -> &str {
    match number.char_indices().rev().nth(3) {
        Some((idx, _)) => &number[idx..],
        None => number,
    }
}

fn masked(number: &str) -> String {
    format!("****{}", last4(number))
}
