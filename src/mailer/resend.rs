// HTTP email API client (Resend-compatible `POST /emails`)

use serde::Deserialize;
use std::time::Duration;

use super::{BoxFuture, EmailSender, MailError, SendReceipt};
use crate::config::EmailConfig;
use crate::contact::email::OutgoingEmail;

#[derive(Debug, Deserialize)]
struct AcceptedBody {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RejectedBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<SendReceipt, MailError> {
        let api_key = self.api_key.as_deref().ok_or(MailError::MissingApiKey)?;

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text, status),
            });
        }

        // Accepted even when the body is not the documented JSON
        let text = resp.text().await.unwrap_or_default();
        let id = serde_json::from_str::<AcceptedBody>(&text)
            .ok()
            .and_then(|b| b.id);
        Ok(SendReceipt { id })
    }
}

impl EmailSender for ResendMailer {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<SendReceipt, MailError>> {
        Box::pin(self.deliver(email))
    }
}

/// Pull the provider's explanation out of an error body
fn rejection_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<RejectedBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|m| !m.is_empty()))
        .unwrap_or_else(|| status.to_string())
}
