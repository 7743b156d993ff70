use estate_market::billing::PaystackClient;
use estate_market::config::AppConfig;
use estate_market::error::AppError;
use estate_market::mail::{MailError, Mailer, OutboundEmail};
use estate_market::store::MemoryStore;
use estate_market::Marketplace;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes outbound e-mail to the log instead of an SMTP relay.
#[derive(Debug, Default, Clone)]
pub(crate) struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if email.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        info!(
            from = %email.from,
            to = %email.to.join(", "),
            reply_to = email.reply_to.as_deref().unwrap_or("-"),
            subject = %email.subject,
            "email sent"
        );
        Ok(())
    }
}

/// In-memory store, log mailer and the live Paystack client.
pub(crate) fn build_marketplace(config: &AppConfig) -> Result<Marketplace, AppError> {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(PaystackClient::new(&config.paystack)?);
    Ok(Marketplace::from_config(
        config,
        store,
        Arc::new(LogMailer),
        gateway,
    ))
}
