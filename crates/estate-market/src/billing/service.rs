use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::domain::{
    AgentSubscription, Feature, FeaturedListing, InitiateOutcome, Payment, PaymentStatus,
    PlanConfig, StartOutcome, SubscriptionPlan, BILLING_PERIOD_DAYS, BOOST_DURATION_DAYS,
    PAYMENT_CURRENCY, PAYMENT_METHOD,
};
use super::gateway::{verify_signature, GatewayError, InitializeRequest, PaymentGateway};
use super::repository::BillingRepository;
use crate::accounts::{AccountRepository, Actor, AgentProfile};
use crate::config::PaystackConfig;
use crate::error::FieldError;
use crate::listings::ListingRepository;
use crate::shared::{FeaturedListingId, Money, PaymentId, PropertyId, SubscriptionId, UserId};
use crate::store::RepositoryError;

/// Settlement reported by the gateway, from the webhook or a verify call.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub reference: String,
    pub amount_kobo: u64,
    pub status: PaymentStatus,
    pub user: Option<UserId>,
    pub plan: Option<SubscriptionPlan>,
}

/// What the webhook endpoint did with an authentic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed { reference: String },
    Ignored,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookData {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    amount: Option<u64>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Service owning plans, agent subscriptions, payments and featured boosts.
pub struct BillingService {
    repository: Arc<dyn BillingRepository>,
    accounts: Arc<dyn AccountRepository>,
    listings: Arc<dyn ListingRepository>,
    gateway: Arc<dyn PaymentGateway>,
    paystack: PaystackConfig,
}

impl BillingService {
    pub fn new(
        repository: Arc<dyn BillingRepository>,
        accounts: Arc<dyn AccountRepository>,
        listings: Arc<dyn ListingRepository>,
        gateway: Arc<dyn PaymentGateway>,
        paystack: PaystackConfig,
    ) -> Self {
        Self {
            repository,
            accounts,
            listings,
            gateway,
            paystack,
        }
    }

    /// The agent's current subscription when it is still valid.
    pub fn current_subscription(
        &self,
        agent: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<AgentSubscription>, BillingError> {
        let Some(profile) = self.accounts.agent_profile(agent)? else {
            return Ok(None);
        };
        let Some(id) = profile.current_subscription else {
            return Ok(None);
        };
        Ok(self
            .repository
            .subscription(id)?
            .filter(|subscription| subscription.is_valid(now)))
    }

    pub fn current_plan(
        &self,
        agent: UserId,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionPlan, BillingError> {
        Ok(self
            .current_subscription(agent, now)?
            .map_or(SubscriptionPlan::Free, |subscription| subscription.plan))
    }

    /// Rejects when `current_count` already meets the plan's cap.
    pub fn check_feature_limit(
        &self,
        agent: UserId,
        feature: Feature,
        current_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        let plan = self.current_plan(agent, now)?;
        match plan.limits().limit(feature) {
            Some(limit) if current_count >= limit => Err(BillingError::LimitReached {
                feature: feature.key(),
                limit,
                plan,
            }),
            _ => Ok(()),
        }
    }

    /// Grant the one-off Basic trial. `None` when the agent already had one.
    pub fn start_trial(
        &self,
        agent: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<AgentSubscription>, BillingError> {
        if self
            .repository
            .subscriptions_for(agent)?
            .iter()
            .any(|subscription| subscription.is_trial)
        {
            return Ok(None);
        }

        let trial = self.repository.insert_subscription(AgentSubscription {
            id: SubscriptionId::new(),
            agent,
            plan: SubscriptionPlan::Basic,
            is_trial: true,
            is_active: true,
            start_date: now,
            end_date: Some(now + Duration::days(BILLING_PERIOD_DAYS)),
            amount_paid: Money::ZERO,
            transaction_id: None,
        })?;
        self.set_current(agent, trial.id)?;
        info!(%agent, subscription = %trial.id, "basic trial started");
        Ok(Some(trial))
    }

    pub fn plans(&self) -> Result<Vec<PlanConfig>, BillingError> {
        let mut plans = self.repository.plans()?;
        plans.sort_by_key(|plan| plan.price);
        Ok(plans)
    }

    pub fn start(&self, actor: &Actor, now: DateTime<Utc>) -> Result<StartOutcome, BillingError> {
        self.agent_profile(actor)?;
        if let Some(subscription) = self.current_subscription(actor.user_id, now)? {
            return Ok(StartOutcome::AlreadySubscribed { subscription });
        }
        Ok(StartOutcome::ChoosePlan {
            plans: self.plans()?,
        })
    }

    pub async fn initiate_payment(
        &self,
        actor: &Actor,
        plan: SubscriptionPlan,
        now: DateTime<Utc>,
    ) -> Result<InitiateOutcome, BillingError> {
        self.agent_profile(actor)?;
        let agent = actor.user_id;
        let config = self
            .repository
            .plan(plan)?
            .ok_or(BillingError::UnknownPlan(plan.key().to_string()))?;

        if plan == SubscriptionPlan::Basic {
            if let Some(subscription) = self.start_trial(agent, now)? {
                return Ok(InitiateOutcome::TrialStarted { subscription });
            }
        }

        let user = self.accounts.user(agent)?.ok_or(BillingError::Forbidden)?;
        let mut metadata = BTreeMap::new();
        metadata.insert("agent_id".to_string(), agent.to_string());
        metadata.insert("plan".to_string(), plan.key().to_string());

        let transaction = self
            .gateway
            .initialize(InitializeRequest {
                email: user.email.clone(),
                amount: config.price.minor(),
                callback_url: self.paystack.callback_url.clone(),
                metadata,
            })
            .await
            .map_err(|err| {
                error!(%agent, error = %err, "payment initialization failed");
                BillingError::Gateway(err)
            })?;

        let reference = transaction
            .reference
            .filter(|reference| !reference.is_empty())
            .ok_or(BillingError::Gateway(GatewayError::MissingField("reference")))?;
        let authorization_url = transaction
            .authorization_url
            .filter(|url| !url.is_empty())
            .ok_or(BillingError::Gateway(GatewayError::MissingField(
                "authorization_url",
            )))?;

        let existing = self
            .repository
            .subscriptions_for(agent)?
            .into_iter()
            .find(|subscription| subscription.transaction_id.as_deref() == Some(&reference));
        let subscription = match existing {
            Some(mut subscription) => {
                subscription.plan = plan;
                subscription.amount_paid = config.price;
                subscription.is_active = false;
                self.repository.update_subscription(subscription.clone())?;
                subscription
            }
            None => self.repository.insert_subscription(AgentSubscription {
                id: SubscriptionId::new(),
                agent,
                plan,
                is_trial: false,
                is_active: false,
                start_date: now,
                end_date: None,
                amount_paid: config.price,
                transaction_id: Some(reference.clone()),
            })?,
        };

        let pending = Payment {
            id: PaymentId::new(),
            user: Some(agent),
            subscription: Some(subscription.id),
            reference: reference.clone(),
            amount: config.price,
            currency: PAYMENT_CURRENCY.to_string(),
            status: PaymentStatus::Pending,
            payment_method: PAYMENT_METHOD.to_string(),
            created_at: now,
        };
        match self.repository.payment_by_reference(&reference)? {
            Some(existing) => self.repository.update_payment(Payment {
                id: existing.id,
                created_at: existing.created_at,
                ..pending
            })?,
            None => {
                self.repository.insert_payment(pending)?;
            }
        }

        info!(%agent, %reference, plan = plan.key(), "redirecting to payment checkout");
        Ok(InitiateOutcome::Redirect {
            authorization_url,
            reference,
        })
    }

    pub async fn verify_payment(
        &self,
        actor: &Actor,
        reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AgentSubscription, BillingError> {
        let reference = reference
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .ok_or_else(|| FieldError::new("reference", "Missing transaction reference."))?;

        let mut payment = self
            .repository
            .payment_by_reference(reference)?
            .filter(|payment| payment.user == Some(actor.user_id))
            .ok_or(BillingError::UnknownReference)?;

        if payment.status == PaymentStatus::Success {
            if let Some(settled) = self.linked_subscription(&payment)? {
                info!(%reference, "payment already settled");
                return Ok(settled);
            }
        }

        let verified = self.gateway.verify(reference).await.map_err(|err| {
            error!(%reference, error = %err, "payment verification failed");
            BillingError::Gateway(err)
        })?;

        payment.amount = Money::from_minor(verified.amount);
        if PaymentStatus::from_gateway(&verified.status) != PaymentStatus::Success {
            payment.status = PaymentStatus::Failed;
            self.repository.update_payment(payment)?;
            return Err(BillingError::PaymentNotSuccessful(verified.status));
        }
        payment.status = PaymentStatus::Success;

        let mut subscription = match self.linked_subscription(&payment)? {
            Some(subscription) => subscription,
            None => {
                warn!(%reference, "payment had no subscription, creating one");
                let plan = verified
                    .metadata_str("plan")
                    .and_then(|raw| SubscriptionPlan::parse(&raw))
                    .ok_or_else(|| BillingError::UnknownPlan("missing".to_string()))?;
                let created = self.repository.insert_subscription(AgentSubscription {
                    id: SubscriptionId::new(),
                    agent: actor.user_id,
                    plan,
                    is_trial: false,
                    is_active: false,
                    start_date: now,
                    end_date: None,
                    amount_paid: payment.amount,
                    transaction_id: Some(reference.to_string()),
                })?;
                payment.subscription = Some(created.id);
                created
            }
        };
        self.repository.update_payment(payment.clone())?;

        subscription.renew(reference, payment.amount, now);
        self.repository.update_subscription(subscription.clone())?;
        self.set_current(subscription.agent, subscription.id)?;
        info!(agent = %subscription.agent, %reference, "subscription activated");
        Ok(subscription)
    }

    /// Idempotent settlement keyed by the payment reference.
    pub fn handle_gateway_payment(
        &self,
        settlement: GatewayPayment,
        now: DateTime<Utc>,
    ) -> Result<Payment, BillingError> {
        let amount = Money::from_minor(settlement.amount_kobo);
        let existing = self.repository.payment_by_reference(&settlement.reference)?;
        if let Some(existing) = existing.as_ref() {
            if existing.status == PaymentStatus::Success {
                info!(reference = %settlement.reference, "payment already processed");
                return Ok(existing.clone());
            }
        }

        // Nothing is written until the plan and amount check out.
        if let Some(plan) = settlement.plan {
            let config = self
                .repository
                .plan(plan)?
                .ok_or(BillingError::UnknownPlan(plan.key().to_string()))?;
            if amount < config.price {
                warn!(reference = %settlement.reference, %amount, "settlement below plan price");
                return Err(BillingError::AmountMismatch {
                    paid: amount,
                    required: config.price,
                    plan,
                });
            }
        }

        let mut payment = match existing {
            Some(mut existing) => {
                existing.status = settlement.status;
                existing.amount = amount;
                self.repository.update_payment(existing.clone())?;
                existing
            }
            None => self.repository.insert_payment(Payment {
                id: PaymentId::new(),
                user: settlement.user,
                subscription: None,
                reference: settlement.reference.clone(),
                amount,
                currency: PAYMENT_CURRENCY.to_string(),
                status: settlement.status,
                payment_method: PAYMENT_METHOD.to_string(),
                created_at: now,
            })?,
        };

        if let Some(plan) = settlement.plan {
            let mut subscription = match self.linked_subscription(&payment)? {
                Some(subscription) => subscription,
                None => {
                    let agent = payment.user.or(settlement.user).ok_or_else(|| {
                        FieldError::new("user", "User is required to attach subscription.")
                    })?;
                    let created = self.repository.insert_subscription(AgentSubscription {
                        id: SubscriptionId::new(),
                        agent,
                        plan,
                        is_trial: false,
                        is_active: false,
                        start_date: now,
                        end_date: None,
                        amount_paid: payment.amount,
                        transaction_id: Some(settlement.reference.clone()),
                    })?;
                    payment.subscription = Some(created.id);
                    self.repository.update_payment(payment.clone())?;
                    created
                }
            };

            subscription.renew(&settlement.reference, payment.amount, now);
            self.repository.update_subscription(subscription.clone())?;
            self.set_current(subscription.agent, subscription.id)?;
            info!(
                agent = %subscription.agent,
                reference = %settlement.reference,
                "subscription renewed"
            );
        }

        info!(reference = %settlement.reference, "gateway payment processed");
        Ok(payment)
    }

    /// Authenticate and apply a raw webhook delivery.
    pub fn process_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let signature = signature.ok_or_else(|| {
            warn!("webhook without signature");
            WebhookError::MissingSignature
        })?;
        if !verify_signature(&self.paystack.secret_key, body, signature) {
            warn!("webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }
        let event: WebhookEvent = serde_json::from_slice(body).map_err(|err| {
            warn!(error = %err, "webhook payload is not valid json");
            WebhookError::InvalidPayload(err.to_string())
        })?;

        let data = event.data;
        let is_charge = event.event.as_deref() == Some("charge.success")
            && data.status.as_deref() == Some("success");
        let reference = data.reference.filter(|reference| !reference.is_empty());
        let (true, Some(reference)) = (is_charge, reference) else {
            return Ok(WebhookOutcome::Ignored);
        };

        let metadata_str = |key: &str| {
            data.metadata
                .as_ref()
                .and_then(|metadata| metadata.get(key))
                .and_then(|value| value.as_str())
                .map(str::to_string)
        };
        let settlement = GatewayPayment {
            reference: reference.clone(),
            amount_kobo: data.amount.unwrap_or(0),
            status: PaymentStatus::Success,
            user: metadata_str("agent_id").and_then(|raw| raw.parse().ok()),
            plan: metadata_str("plan").and_then(|raw| SubscriptionPlan::parse(&raw)),
        };

        self.handle_gateway_payment(settlement, now)
            .map_err(|err| {
                error!(%reference, error = %err, "webhook processing failed");
                WebhookError::Processing(err)
            })?;
        Ok(WebhookOutcome::Processed { reference })
    }

    pub fn subscription_detail(
        &self,
        actor: &Actor,
        id: SubscriptionId,
    ) -> Result<AgentSubscription, BillingError> {
        self.agent_profile(actor)?;
        self.repository
            .subscription(id)?
            .filter(|subscription| subscription.agent == actor.user_id)
            .ok_or(BillingError::NotFound)
    }

    pub fn feature_property(
        &self,
        actor: &Actor,
        property: PropertyId,
        now: DateTime<Utc>,
    ) -> Result<FeaturedListing, BillingError> {
        self.agent_profile(actor)?;
        self.owned_property(actor, property)?;

        let boosts = self.repository.featured_listings()?;
        let active = boosts
            .iter()
            .filter(|boost| boost.agent == actor.user_id && boost.is_live(now))
            .count();
        self.check_feature_limit(actor.user_id, Feature::FeaturedListings, active, now)?;

        for mut boost in boosts
            .into_iter()
            .filter(|boost| boost.property == property && boost.is_active)
        {
            boost.is_active = false;
            self.repository.update_featured(boost)?;
        }

        let boost = self.repository.insert_featured(FeaturedListing {
            id: FeaturedListingId::new(),
            property,
            agent: actor.user_id,
            boost_duration_days: BOOST_DURATION_DAYS,
            start_date: now,
            end_date: now + Duration::days(BOOST_DURATION_DAYS),
            is_active: true,
        })?;
        info!(agent = %actor.user_id, %property, "property featured");
        Ok(boost)
    }

    /// Deactivate every active boost on the property; returns how many changed.
    pub fn unfeature_property(
        &self,
        actor: &Actor,
        property: PropertyId,
    ) -> Result<usize, BillingError> {
        self.agent_profile(actor)?;
        self.owned_property(actor, property)?;

        let mut updated = 0;
        for mut boost in self
            .repository
            .featured_listings()?
            .into_iter()
            .filter(|boost| boost.property == property && boost.is_active)
        {
            boost.is_active = false;
            self.repository.update_featured(boost)?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Properties carrying a live boost right now.
    pub fn featured_property_ids(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HashSet<PropertyId>, RepositoryError> {
        Ok(self
            .repository
            .featured_listings()?
            .into_iter()
            .filter(|boost| boost.is_live(now))
            .map(|boost| boost.property)
            .collect())
    }

    pub fn active_featured_count(
        &self,
        agent: UserId,
        now: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        Ok(self
            .repository
            .featured_listings()?
            .iter()
            .filter(|boost| boost.agent == agent && boost.is_live(now))
            .count())
    }

    fn agent_profile(&self, actor: &Actor) -> Result<AgentProfile, BillingError> {
        if !actor.is_agent() {
            return Err(BillingError::Forbidden);
        }
        self.accounts
            .agent_profile(actor.user_id)?
            .ok_or(BillingError::Forbidden)
    }

    fn owned_property(&self, actor: &Actor, property: PropertyId) -> Result<(), BillingError> {
        match self.listings.property(property)? {
            Some(found) if found.agent_id == actor.user_id => Ok(()),
            _ => Err(BillingError::NotFound),
        }
    }

    fn linked_subscription(
        &self,
        payment: &Payment,
    ) -> Result<Option<AgentSubscription>, BillingError> {
        match payment.subscription {
            Some(id) => Ok(self.repository.subscription(id)?),
            None => Ok(None),
        }
    }

    fn set_current(&self, agent: UserId, subscription: SubscriptionId) -> Result<(), BillingError> {
        let mut profile = self
            .accounts
            .agent_profile(agent)?
            .unwrap_or_else(|| AgentProfile::new(agent));
        profile.current_subscription = Some(subscription);
        self.accounts.upsert_agent_profile(profile)?;
        Ok(())
    }
}

/// Error raised by the billing service.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("only agents can manage subscriptions and boosts")]
    Forbidden,
    #[error("subscription or property not found")]
    NotFound,
    #[error("Invalid or unknown payment reference.")]
    UnknownReference,
    #[error("Invalid subscription plan: {0}")]
    UnknownPlan(String),
    #[error("You have reached the {feature} limit ({limit}) for the {plan} plan. Please upgrade.")]
    LimitReached {
        feature: &'static str,
        limit: usize,
        plan: SubscriptionPlan,
    },
    #[error("Payment {paid} does not match plan {plan} price {required}")]
    AmountMismatch {
        paid: Money,
        required: Money,
        plan: SubscriptionPlan,
    },
    #[error("payment was not successful (status {0})")]
    PaymentNotSuccessful(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Rejections of an inbound webhook delivery.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing signature")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("webhook processing failed: {0}")]
    Processing(BillingError),
}
