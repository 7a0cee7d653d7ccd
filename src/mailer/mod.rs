//! Outbound email
//!
//! `EmailSender` is the seam between the contact pipeline and the
//! transactional email provider.

mod resend;

pub use resend::ResendMailer;

use std::future::Future;
use std::pin::Pin;

use crate::contact::email::OutgoingEmail;

/// Boxed future returned by the service seams
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Provider acknowledgement of an accepted email
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Missing API key. Set RESEND_API_KEY or email.api_key")]
    MissingApiKey,
    #[error("Email API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Email API rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

pub trait EmailSender: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<SendReceipt, MailError>>;
}

/// Test doubles shared by the handler and client tests
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Accepts every email and keeps a copy
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl RecordingMailer {
        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl EmailSender for RecordingMailer {
        fn send<'a>(
            &'a self,
            email: &'a OutgoingEmail,
        ) -> BoxFuture<'a, Result<SendReceipt, MailError>> {
            Box::pin(async move {
                let mut sent = self.sent.lock().unwrap();
                sent.push(email.clone());
                Ok(SendReceipt {
                    id: Some(format!("email-{}", sent.len())),
                })
            })
        }
    }

    /// Rejects every email the way the provider does for a bad key
    #[derive(Debug, Default)]
    pub struct FailingMailer {
        pub calls: AtomicUsize,
    }

    impl EmailSender for FailingMailer {
        fn send<'a>(
            &'a self,
            _email: &'a OutgoingEmail,
        ) -> BoxFuture<'a, Result<SendReceipt, MailError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                Err(MailError::Rejected {
                    status: 401,
                    message: "API key is invalid".to_string(),
                })
            })
        }
    }
}
