use super::domain::{AgentSubscription, FeaturedListing, Payment, PlanConfig, SubscriptionPlan};
use crate::shared::{SubscriptionId, UserId};
use crate::store::RepositoryError;

/// Storage abstraction for plans, subscriptions, payments and boosts.
pub trait BillingRepository: Send + Sync {
    fn plans(&self) -> Result<Vec<PlanConfig>, RepositoryError>;
    fn plan(&self, plan: SubscriptionPlan) -> Result<Option<PlanConfig>, RepositoryError>;
    fn upsert_plan(&self, plan: PlanConfig) -> Result<(), RepositoryError>;

    fn insert_subscription(
        &self,
        subscription: AgentSubscription,
    ) -> Result<AgentSubscription, RepositoryError>;
    fn update_subscription(&self, subscription: AgentSubscription) -> Result<(), RepositoryError>;
    fn subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<Option<AgentSubscription>, RepositoryError>;
    fn subscriptions_for(&self, agent: UserId) -> Result<Vec<AgentSubscription>, RepositoryError>;

    /// `Conflict` when the reference is already recorded.
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError>;
    fn payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, RepositoryError>;

    fn insert_featured(&self, listing: FeaturedListing)
        -> Result<FeaturedListing, RepositoryError>;
    fn update_featured(&self, listing: FeaturedListing) -> Result<(), RepositoryError>;
    fn featured_listings(&self) -> Result<Vec<FeaturedListing>, RepositoryError>;
}
