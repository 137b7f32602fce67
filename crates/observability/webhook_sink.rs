use super::notifier::{AlertEvent, AlertSink};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use url::Url;

const SUMMARY_LIMIT: usize = 2000;
const TRUNCATED_SUFFIX: &str = "\n... (truncated)";

/// Posts alerts as JSON: a human `text` summary plus the structured `event`.
pub(crate) struct WebhookAlertSink {
    webhook_url: Url,
    client: Client,
}

impl WebhookAlertSink {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, event: &AlertEvent) -> Result<()> {
        let body = json!({
            "text": summarize(event),
            "event": event,
        });

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "alert webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn sink_name(&self) -> &'static str {
        "webhook"
    }
}

fn summarize(event: &AlertEvent) -> String {
    let mut lines = vec![format!(
        "[{}] {} ({}/{}) at {}",
        event.level,
        event.service_name,
        event.environment,
        event.component,
        event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    )];

    match &event.location {
        Some(location) => lines.push(format!("{} {}", event.target, location)),
        None => lines.push(event.target.clone()),
    }

    if let Some(message) = event.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        lines.push(format!("> {message}"));
    }

    for (key, value) in &event.fields {
        lines.push(format!("{key} = {value}"));
    }

    if !event.spans.is_empty() {
        let chain = event
            .spans
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ");
        lines.push(format!("spans: {chain}"));
    }

    truncate(lines.join("\n"))
}

// reqwest errors embed the request URL, which carries the webhook token.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("alert webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("alert webhook connection failed");
    }
    anyhow!("alert webhook request failed")
}

fn truncate(content: String) -> String {
    if content.chars().count() <= SUMMARY_LIMIT {
        return content;
    }

    let allowed = SUMMARY_LIMIT.saturating_sub(TRUNCATED_SUFFIX.chars().count());
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(TRUNCATED_SUFFIX);
    truncated
}
