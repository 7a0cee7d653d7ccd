// Submission client for the contact endpoint
// Validates locally, then posts the JSON payload

use serde::Deserialize;

use super::form::{ContactForm, ValidationErrors};

pub const SUCCESS_NOTICE: &str = "Thank you! We'll get back to you within 24 hours.";
pub const FAILURE_NOTICE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Server verdict on a submitted form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    RateLimited,
    Failed(String),
}

impl SubmitOutcome {
    /// Notification text shown to the visitor
    pub const fn notice(&self) -> &'static str {
        match self {
            Self::Sent => SUCCESS_NOTICE,
            Self::RateLimited | Self::Failed(_) => FAILURE_NOTICE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ContactClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http, endpoint))
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Validate `form` and submit it.
    ///
    /// Field errors are returned before any request is made.
    pub async fn submit(&self, form: &ContactForm) -> Result<SubmitOutcome, ClientError> {
        let submission = form.validate()?;

        let resp = self.http.post(&self.endpoint).json(&submission).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::OK {
            return Ok(SubmitOutcome::Sent);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(SubmitOutcome::RateLimited);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.to_string());
        Ok(SubmitOutcome::Failed(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppState;
    use crate::contact::form::Field;
    use crate::handler;
    use crate::mailer::testing::{FailingMailer, RecordingMailer};
    use crate::mailer::EmailSender;
    use crate::telemetry::Telemetry;
    use crate::testing::test_config;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper_util::rt::TokioIo;
    use std::sync::Arc;

    fn jane() -> ContactForm {
        ContactForm {
            name: "Jane Doe".to_string(),
            organization: "Acme".to_string(),
            contact: "jane@acme.io".to_string(),
            description: "Need a review of our vault contracts".to_string(),
            budget: "$5,000".to_string(),
        }
    }

    /// Serve the router on an ephemeral port and return the contact URL
    async fn spawn_server(mailer: Arc<dyn EmailSender>, max_requests: u32) -> String {
        let mut config = test_config();
        config.rate_limit.max_requests = max_requests;
        let state = Arc::new(AppState::with_services(&config, mailer, Telemetry::disabled()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let service =
                        service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer));
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        format!("http://{addr}/send-contact-email")
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_network() {
        // Nothing listens on the discard port; a request would fail with Http
        let client = ContactClient::new("http://127.0.0.1:9/").unwrap();
        let mut form = jane();
        form.description = "short".to_string();

        match client.submit(&form).await {
            Err(ClientError::Validation(errors)) => {
                assert_eq!(errors.fields().collect::<Vec<_>>(), vec![Field::Description]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_end_to_end() {
        let mailer = Arc::new(RecordingMailer::default());
        let endpoint = spawn_server(mailer.clone(), 5).await;
        let client = ContactClient::new(endpoint).unwrap();

        let outcome = client.submit(&jane()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Sent);
        assert_eq!(outcome.notice(), SUCCESS_NOTICE);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains("Acme"));
    }

    #[tokio::test]
    async fn test_rate_limited_outcome() {
        let endpoint = spawn_server(Arc::new(RecordingMailer::default()), 1).await;
        let client = ContactClient::new(endpoint).unwrap();

        assert_eq!(client.submit(&jane()).await.unwrap(), SubmitOutcome::Sent);
        let outcome = client.submit(&jane()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::RateLimited);
        assert_eq!(outcome.notice(), FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_server_failure_carries_message() {
        let endpoint = spawn_server(Arc::new(FailingMailer::default()), 5).await;
        let client = ContactClient::new(endpoint).unwrap();

        match client.submit(&jane()).await.unwrap() {
            SubmitOutcome::Failed(message) => assert!(message.contains("API key is invalid")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
