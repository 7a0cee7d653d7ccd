// Third-party analytics forwarding (Plausible-compatible events API)

use serde_json::{json, Value};
use std::time::Duration;

use super::events::{AnalyticsEvent, PAGE_VIEW};
use super::TelemetryError;
use crate::config::AnalyticsConfig;

const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AnalyticsForwarder {
    client: reqwest::Client,
    events_url: String,
    domain: String,
}

impl AnalyticsForwarder {
    /// Build the forwarder, or `None` when forwarding is disabled
    pub fn from_config(config: &AnalyticsConfig) -> Result<Option<Self>, TelemetryError> {
        if !config.enabled {
            return Ok(None);
        }
        let client = reqwest::Client::builder().timeout(FORWARD_TIMEOUT).build()?;
        Ok(Some(Self {
            client,
            events_url: config.events_url.clone(),
            domain: config.domain.clone(),
        }))
    }

    pub async fn forward(&self, event: &AnalyticsEvent) -> Result<(), TelemetryError> {
        let mut req = self
            .client
            .post(&self.events_url)
            .json(&payload(event, &self.domain));
        if !event.user_agent.is_empty() {
            req = req.header("User-Agent", &event.user_agent);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(TelemetryError::Rejected {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        })
    }
}

/// Events API body for one event; page views use the provider's `pageview` name
pub fn payload(event: &AnalyticsEvent, domain: &str) -> Value {
    let name = if event.event_name == PAGE_VIEW {
        "pageview"
    } else {
        event.event_name.as_str()
    };

    let props: serde_json::Map<String, Value> = event
        .properties
        .iter()
        .filter(|(key, _)| key.as_str() != "timestamp")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    json!({
        "name": name,
        "url": event.page_url,
        "domain": domain,
        "referrer": event.referrer,
        "props": props,
    })
}
