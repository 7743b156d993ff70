//! Wires every area service over one store and exposes the combined router.

use std::sync::Arc;

use axum::{Extension, Router};

use crate::accounts::{account_router, AccountRepository, AccountService};
use crate::auth::TokenAuthority;
use crate::billing::{billing_router, BillingRepository, BillingService, PaymentGateway};
use crate::config::{AppConfig, AuthConfig, MailConfig, PaystackConfig};
use crate::leads::{lead_router, LeadRepository, LeadService};
use crate::listings::{listing_router, ListingRepository, ListingService};
use crate::mail::{Mailer, Postman};
use crate::messaging::{messaging_router, MessagingRepository, MessagingService, Notifier};

/// The assembled marketplace: one service per area sharing a notifier and
/// the billing limits.
#[derive(Clone)]
pub struct Marketplace {
    accounts: Arc<AccountService>,
    listings: Arc<ListingService>,
    leads: Arc<LeadService>,
    messaging: Arc<MessagingService>,
    billing: Arc<BillingService>,
    tokens: TokenAuthority,
}

impl Marketplace {
    pub fn new<S>(
        store: Arc<S>,
        mailer: Arc<dyn Mailer>,
        gateway: Arc<dyn PaymentGateway>,
        auth: &AuthConfig,
        paystack: PaystackConfig,
        mail: MailConfig,
    ) -> Self
    where
        S: AccountRepository
            + ListingRepository
            + LeadRepository
            + MessagingRepository
            + BillingRepository
            + 'static,
    {
        let account_repo: Arc<dyn AccountRepository> = store.clone();
        let listing_repo: Arc<dyn ListingRepository> = store.clone();
        let lead_repo: Arc<dyn LeadRepository> = store.clone();
        let messaging_repo: Arc<dyn MessagingRepository> = store.clone();
        let billing_repo: Arc<dyn BillingRepository> = store;

        let tokens = TokenAuthority::from_config(auth);
        let notifier = Arc::new(Notifier::new(
            messaging_repo.clone(),
            account_repo.clone(),
            Postman::new(mailer, mail),
        ));
        let billing = Arc::new(BillingService::new(
            billing_repo,
            account_repo.clone(),
            listing_repo.clone(),
            gateway,
            paystack,
        ));
        let accounts = Arc::new(AccountService::new(
            account_repo.clone(),
            listing_repo.clone(),
            lead_repo.clone(),
            messaging_repo.clone(),
            notifier.clone(),
            billing.clone(),
            tokens.clone(),
        ));
        let listings = Arc::new(ListingService::new(
            listing_repo.clone(),
            account_repo.clone(),
            billing.clone(),
            notifier.clone(),
        ));
        let leads = Arc::new(LeadService::new(
            lead_repo,
            listing_repo,
            account_repo.clone(),
            notifier.clone(),
        ));
        let messaging = Arc::new(MessagingService::new(messaging_repo, account_repo, notifier));

        Self {
            accounts,
            listings,
            leads,
            messaging,
            billing,
            tokens,
        }
    }

    pub fn from_config<S>(
        config: &AppConfig,
        store: Arc<S>,
        mailer: Arc<dyn Mailer>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self
    where
        S: AccountRepository
            + ListingRepository
            + LeadRepository
            + MessagingRepository
            + BillingRepository
            + 'static,
    {
        Self::new(
            store,
            mailer,
            gateway,
            &config.auth,
            config.paystack.clone(),
            config.mail.clone(),
        )
    }

    pub fn accounts(&self) -> &Arc<AccountService> {
        &self.accounts
    }

    pub fn listings(&self) -> &Arc<ListingService> {
        &self.listings
    }

    pub fn leads(&self) -> &Arc<LeadService> {
        &self.leads
    }

    pub fn messaging(&self) -> &Arc<MessagingService> {
        &self.messaging
    }

    pub fn billing(&self) -> &Arc<BillingService> {
        &self.billing
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// Every `/api/v1` route, with the token authority installed for the
    /// bearer-token extractors.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(account_router(self.accounts.clone()))
            .merge(listing_router(self.listings.clone()))
            .merge(lead_router(self.leads.clone()))
            .merge(messaging_router(self.messaging.clone()))
            .merge(billing_router(self.billing.clone()))
            .layer(Extension(self.tokens.clone()))
    }
}
