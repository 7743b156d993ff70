//! Outbound transactional e-mail.
//!
//! Delivery is best effort: the [`Postman`] logs transport failures and reports
//! them as a flag so that the write which triggered the e-mail always stands.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Transport seam (SMTP, API provider, log sink, test double).
pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email has no recipients")]
    NoRecipients,
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Composes messages with the site identity and delivers them through a
/// [`Mailer`].
#[derive(Clone)]
pub struct Postman {
    mailer: Arc<dyn Mailer>,
    config: MailConfig,
}

impl Postman {
    pub fn new(mailer: Arc<dyn Mailer>, config: MailConfig) -> Self {
        Self { mailer, config }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    /// Send to one recipient with the configured subject prefix. Returns
    /// whether the transport accepted the message.
    pub fn deliver(&self, to: &str, subject: &str, body: String) -> bool {
        self.dispatch(OutboundEmail {
            from: self.config.from_address.clone(),
            to: vec![to.to_string()],
            reply_to: None,
            subject: self.config.subject(subject),
            body,
        })
    }

    pub fn deliver_with_reply_to(
        &self,
        to: &str,
        reply_to: &str,
        subject: &str,
        body: String,
    ) -> bool {
        self.dispatch(OutboundEmail {
            from: self.config.from_address.clone(),
            to: vec![to.to_string()],
            reply_to: Some(reply_to.to_string()),
            subject: self.config.subject(subject),
            body,
        })
    }

    fn dispatch(&self, email: OutboundEmail) -> bool {
        let result = if email.to.iter().all(|address| address.trim().is_empty()) {
            Err(MailError::NoRecipients)
        } else {
            self.mailer.send(&email)
        };

        match result {
            Ok(()) => {
                debug!(subject = %email.subject, recipients = email.to.len(), "email sent");
                true
            }
            Err(err) => {
                warn!(subject = %email.subject, error = %err, "email delivery failed");
                false
            }
        }
    }
}
