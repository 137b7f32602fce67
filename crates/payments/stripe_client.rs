use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API: &str = "https://api.stripe.com/v1";
/// Maximum age of a signed webhook, in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    /// Full response body, kept for the event log.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

#[derive(Debug, Error)]
pub enum WebhookSignatureError {
    #[error("missing timestamp in stripe-signature")]
    MissingTimestamp,
    #[error("missing v1 signature in stripe-signature")]
    MissingSignature,
    #[error("timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Reads an id that Stripe may send either as a string or as an expanded object.
pub fn expandable_id(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(id) => Some(id.clone()),
        serde_json::Value::Object(map) => map.get("id")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Checks a `Stripe-Signature` header (`t=<ts>,v1=<hex>[,v1=<hex>...]`) against the payload.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
    now_ts: i64,
) -> std::result::Result<StripeEvent, WebhookSignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = rest.parse::<i64>().ok();
        } else if let Some(rest) = part.strip_prefix("v1=") {
            if let Ok(bytes) = hex::decode(rest) {
                signatures.push(bytes);
            }
        }
    }

    let timestamp = timestamp.ok_or(WebhookSignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(WebhookSignatureError::MissingSignature);
    }
    if now_ts.abs_diff(timestamp) > WEBHOOK_TOLERANCE_SECS.unsigned_abs() {
        return Err(WebhookSignatureError::Expired);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookSignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time.
    let matched = signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(WebhookSignatureError::Mismatch);
    }

    Ok(serde_json::from_slice(payload)?)
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String, app_base_url: &str) -> Self {
        let base = app_base_url.trim_end_matches('/');
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
            success_url: format!("{base}/billing/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base}/billing/cancel"),
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.clone()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.clone()),
            stripe_error_param = ?details.as_ref().and_then(|d| d.param.clone()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.clone()),
            %context,
            "stripe: api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    async fn read_subscription(resp: reqwest::Response) -> Result<StripeSubscription> {
        let raw: serde_json::Value = resp.json().await?;
        let mut subscription: StripeSubscription = serde_json::from_value(raw.clone())?;
        subscription.raw = raw;
        Ok(subscription)
    }

    /// https://stripe.com/docs/api/customers/create
    pub async fn create_customer(
        &self,
        email: &str,
        name: Option<&str>,
        user_id: Uuid,
    ) -> Result<String> {
        let mut body = vec![
            ("email", email.to_string()),
            ("metadata[userId]", user_id.to_string()),
        ];
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            body.push(("name", name.to_string()));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API}/customers"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed.id)
    }

    /// Creates a subscription-mode Checkout Session and returns its URL.
    /// https://stripe.com/docs/api/checkout/sessions/create
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        let mut body: Vec<(String, String)> = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("customer".to_string(), customer_id.to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("allow_promotion_codes".to_string(), "true".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        let mut metadata: Vec<_> = metadata.into_iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            body.push((format!("metadata[{key}]"), value));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }

    /// https://stripe.com/docs/api/subscriptions/cancel
    pub async fn cancel_subscription_immediately(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription> {
        let resp = self
            .http
            .delete(format!("{STRIPE_API}/subscriptions/{subscription_id}"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "cancel subscription").await?;

        Self::read_subscription(resp).await
    }

    /// https://stripe.com/docs/api/subscriptions/update#update_subscription-cancel_at_period_end
    pub async fn cancel_subscription_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription> {
        let body = [("cancel_at_period_end", "true")];
        let resp = self
            .http
            .post(format!("{STRIPE_API}/subscriptions/{subscription_id}"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "schedule subscription cancellation").await?;

        Self::read_subscription(resp).await
    }

    /// https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> std::result::Result<StripeEvent, WebhookSignatureError> {
        verify_signature(
            &self.webhook_secret,
            payload,
            signature_header,
            Utc::now().timestamp(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn payload() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "invoice.payment_failed",
            "data": { "object": { "id": "in_1", "customer": "cus_1" } }
        }))
        .unwrap()
    }

    #[test]
    fn accepts_valid_signature() {
        let body = payload();
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(&body, now, SECRET));

        let event = verify_signature(SECRET, &body, &header, now + 10).unwrap();

        assert_eq!(event.type_, "invoice.payment_failed");
        assert_eq!(event.data.object["customer"], "cus_1");
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let body = payload();
        let now = 1_700_000_000;
        let header = format!("t={now},v1={},v1={}", "00".repeat(32), sign(&body, now, SECRET));

        assert!(verify_signature(SECRET, &body, &header, now).is_ok());
    }

    #[test]
    fn rejects_wrong_secret_and_tampered_body() {
        let body = payload();
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(&body, now, "whsec_other"));
        assert!(matches!(
            verify_signature(SECRET, &body, &header, now),
            Err(WebhookSignatureError::Mismatch)
        ));

        let header = format!("t={now},v1={}", sign(&body, now, SECRET));
        let mut tampered = body.clone();
        tampered.push(b' ');
        assert!(matches!(
            verify_signature(SECRET, &tampered, &header, now),
            Err(WebhookSignatureError::Mismatch)
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = payload();
        let signed_at = 1_700_000_000;
        let header = format!("t={signed_at},v1={}", sign(&body, signed_at, SECRET));

        let result = verify_signature(SECRET, &body, &header, signed_at + WEBHOOK_TOLERANCE_SECS + 1);

        assert!(matches!(result, Err(WebhookSignatureError::Expired)));
    }

    #[test]
    fn rejects_malformed_headers() {
        let body = payload();
        assert!(matches!(
            verify_signature(SECRET, &body, "v1=abcd", 0),
            Err(WebhookSignatureError::MissingTimestamp)
        ));
        assert!(matches!(
            verify_signature(SECRET, &body, "t=0", 0),
            Err(WebhookSignatureError::MissingSignature)
        ));
        assert!(matches!(
            verify_signature(SECRET, &body, "", 0),
            Err(WebhookSignatureError::MissingTimestamp)
        ));
    }

    #[test]
    fn expandable_id_reads_string_or_object() {
        assert_eq!(expandable_id(Some(&json!("cus_1"))), Some("cus_1".to_string()));
        assert_eq!(
            expandable_id(Some(&json!({ "id": "cus_2", "email": "a@b.co" }))),
            Some("cus_2".to_string())
        );
        assert_eq!(expandable_id(Some(&json!(null))), None);
        assert_eq!(expandable_id(None), None);
    }

    #[test]
    fn checkout_urls_follow_app_base_url() {
        let client = StripeClient::new("sk".into(), SECRET.into(), "https://gym.example.com/");

        assert_eq!(
            client.success_url,
            "https://gym.example.com/billing/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(client.cancel_url, "https://gym.example.com/billing/cancel");
    }
}
