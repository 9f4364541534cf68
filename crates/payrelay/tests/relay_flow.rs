use std::time::Duration;

use payrelay::{
    compute_checksum, CrmCredentials, CrmStatus, DialedInClient, MockTokenizer, NuveiClient,
    PaymentRelay, ProviderCredentials, RelayError, TokenizationRequest, TokenizeBody,
    TokenizerBackend,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_credentials() -> ProviderCredentials {
    ProviderCredentials {
        merchant_id: "merchant-1".to_string(),
        site_id: "site-2".to_string(),
        secret_key: "shh".to_string(),
    }
}

fn crm_credentials() -> CrmCredentials {
    CrmCredentials {
        token: "crm-token".to_string(),
        account_id: "acc-7".to_string(),
    }
}

fn card_request(contact_id: &str) -> TokenizationRequest {
    let body: TokenizeBody = serde_json::from_value(json!({
        "paymentData": {
            "cardNumber": "4000000000000002",
            "cardHolderName": "Jane Doe",
            "expirationMonth": "09",
            "expirationYear": "2029",
            "CVV": "123"
        },
        "type": "card",
        "contactId": contact_id
    }))
    .unwrap();
    TokenizationRequest::try_from(body).unwrap()
}

fn ach_request(contact_id: &str) -> TokenizationRequest {
    let body: TokenizeBody = serde_json::from_value(json!({
        "paymentData": {
            "routingNumber": "021000021",
            "accountNumber": "000123456789",
            "accountHolderName": "Jane Doe",
            "accountType": "checking"
        },
        "type": "ach",
        "contactId": contact_id
    }))
    .unwrap();
    TokenizationRequest::try_from(body).unwrap()
}

fn nuvei(server: &MockServer) -> NuveiClient {
    NuveiClient::new(
        reqwest::Client::new(),
        provider_credentials(),
        format!("{}/ppp/api/v1/tokenization", server.uri()),
    )
}

fn dialedin(server: &MockServer) -> DialedInClient {
    DialedInClient::new(
        reqwest::Client::new(),
        Some(crm_credentials()),
        format!("{}/HttpImport/UpdateLead.php", server.uri()),
    )
}

async fn mount_nuvei(server: &MockServer, response: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/ppp/api/v1/tokenization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_card_tokenized_and_lead_updated() {
    let server = MockServer::start().await;
    mount_nuvei(&server, json!({ "status": "SUCCESS", "token": "T" })).await;
    Mock::given(method("GET"))
        .and(path("/HttpImport/UpdateLead.php"))
        .and(query_param("token", "crm-token"))
        .and(query_param("accid", "acc-7"))
        .and(query_param("SearchField", "LeadId"))
        .and(query_param("Identifier", "lead-1"))
        .and(query_param("adv_PayGUID", "T"))
        .and(query_param("adv_PayType", "Charge Card"))
        .and(query_param("adv_Last4", "0002"))
        .and(query_param("adv_EXMO", "09"))
        .and(query_param("adv_EXYR", "2029"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    let outcome = relay.tokenize(card_request("lead-1")).await.unwrap();

    assert_eq!(outcome.token, "T");
    assert_eq!(outcome.message, "Payment method successfully tokenized");
    assert!(!outcome.test_mode);
    assert_eq!(outcome.crm, CrmStatus::Updated);
}

#[tokio::test]
async fn test_provider_payload_carries_checksum_and_card_fields() {
    let server = MockServer::start().await;
    mount_nuvei(&server, json!({ "status": "SUCCESS", "token": "T" })).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    relay.tokenize(card_request("lead-1")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("provider was called");
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();

    let timestamp = body["timeStamp"].as_i64().unwrap();
    assert_eq!(
        body["checksum"],
        compute_checksum("merchant-1", "site-2", timestamp, "shh")
    );
    assert_eq!(body["merchantId"], "merchant-1");
    assert_eq!(body["merchantSiteId"], "site-2");
    assert_eq!(
        body["cardData"],
        json!({
            "cardNumber": "4000000000000002",
            "cardHolderName": "Jane Doe",
            "expirationMonth": "09",
            "expirationYear": "2029",
            "CVV": "123"
        })
    );
}

#[tokio::test]
async fn test_ach_lead_update_has_empty_expiry() {
    let server = MockServer::start().await;
    mount_nuvei(&server, json!({ "status": "SUCCESS", "token": "A" })).await;
    Mock::given(method("GET"))
        .and(query_param("adv_PayType", "EFT"))
        .and(query_param("adv_Last4", "6789"))
        .and(query_param("adv_EXMO", ""))
        .and(query_param("adv_EXYR", ""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    let outcome = relay.tokenize(ach_request("lead-2")).await.unwrap();

    assert_eq!(outcome.token, "A");
    assert_eq!(outcome.crm, CrmStatus::Updated);

    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(body["accountData"]["accountNumber"], "000123456789");
    assert!(body.get("cardData").is_none());
}

#[tokio::test]
async fn test_crm_error_does_not_fail_tokenization() {
    let server = MockServer::start().await;
    mount_nuvei(&server, json!({ "status": "SUCCESS", "token": "T" })).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    let outcome = relay.tokenize(card_request("lead-1")).await.unwrap();

    assert_eq!(outcome.token, "T");
    assert_eq!(outcome.crm, CrmStatus::Failed);
}

#[tokio::test]
async fn test_crm_timeout_does_not_fail_tokenization() {
    let server = MockServer::start().await;
    mount_nuvei(&server, json!({ "status": "SUCCESS", "token": "T" })).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let crm = dialedin(&server).with_timeout(Duration::from_millis(100));
    let relay = PaymentRelay::new(nuvei(&server), crm);
    let outcome = relay.tokenize(card_request("lead-1")).await.unwrap();

    assert_eq!(outcome.token, "T");
    assert_eq!(outcome.crm, CrmStatus::Failed);
}

#[tokio::test]
async fn test_provider_rejection_skips_crm() {
    let server = MockServer::start().await;
    mount_nuvei(&server, json!({ "status": "ERROR", "reason": "Card expired" })).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    let err = relay.tokenize(card_request("lead-1")).await.unwrap_err();

    match err {
        RelayError::Provider(reason) => assert_eq!(reason, "Card expired"),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_http_error_is_internal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    let err = relay.tokenize(card_request("lead-1")).await.unwrap_err();
    assert!(matches!(err, RelayError::Internal(_)));
}

#[tokio::test]
async fn test_provider_malformed_body_is_internal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(nuvei(&server), dialedin(&server));
    let err = relay.tokenize(card_request("lead-1")).await.unwrap_err();
    assert!(matches!(err, RelayError::Internal(_)));
}

#[tokio::test]
async fn test_provider_timeout_is_internal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "SUCCESS", "token": "T" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let provider = nuvei(&server).with_timeout(Duration::from_millis(100));
    let relay = PaymentRelay::new(provider, dialedin(&server));
    let err = relay.tokenize(card_request("lead-1")).await.unwrap_err();
    match err {
        RelayError::Internal(msg) => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("expected internal error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mock_mode_without_crm_credentials() {
    let crm = DialedInClient::new(reqwest::Client::new(), None, "http://127.0.0.1:9/unused");
    let relay = PaymentRelay::new(TokenizerBackend::Mock(MockTokenizer::new()), crm);

    let pattern = regex::Regex::new(r"^(card|ach)_tok_[0-9a-z]+_[0-9a-z]+$").unwrap();

    let first = relay.tokenize(card_request("lead-1")).await.unwrap();
    let second = relay.tokenize(card_request("lead-1")).await.unwrap();
    let ach = relay.tokenize(ach_request("lead-1")).await.unwrap();

    assert!(first.test_mode);
    assert!(first.token.starts_with("card_tok_"));
    assert!(ach.token.starts_with("ach_tok_"));
    assert!(pattern.is_match(&first.token), "{}", first.token);
    assert!(pattern.is_match(&ach.token), "{}", ach.token);
    assert_ne!(first.token, second.token);
    assert_eq!(first.crm, CrmStatus::Skipped);
}

#[tokio::test]
async fn test_mock_mode_still_updates_crm() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/HttpImport/UpdateLead.php"))
        .and(query_param("adv_Last4", "0002"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let relay = PaymentRelay::new(
        TokenizerBackend::Mock(MockTokenizer::new()),
        dialedin(&server),
    );
    let outcome = relay.tokenize(card_request("lead-3")).await.unwrap();

    assert!(outcome.test_mode);
    assert_eq!(outcome.crm, CrmStatus::Updated);
}
