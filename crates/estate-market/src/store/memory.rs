use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::RepositoryError;
use crate::accounts::{AccountRepository, AgentProfile, User, UserProfile};
use crate::billing::{
    AgentSubscription, BillingRepository, FeaturedListing, Payment, PlanConfig, SubscriptionPlan,
};
use crate::leads::{Lead, LeadRepository, PropertyViewing};
use crate::listings::{
    Amenity, FavoriteProperty, ListingRepository, Property, PropertyImage, PropertySubscription,
    PropertyType,
};
use crate::mail::{MailError, Mailer, OutboundEmail};
use crate::messaging::{Message, MessagingRepository, Notification, NotificationPreference};
use crate::shared::{
    AlertSubscriptionId, AmenityId, FavoriteId, FeaturedListingId, ImageId, LeadId, MessageId,
    NotificationId, PropertyId, SubscriptionId, UserId, ViewingId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    user_profiles: HashMap<UserId, UserProfile>,
    agent_profiles: HashMap<UserId, AgentProfile>,
    properties: HashMap<PropertyId, Property>,
    custom_types: Vec<PropertyType>,
    images: HashMap<ImageId, PropertyImage>,
    amenities: HashMap<AmenityId, Amenity>,
    favorites: HashMap<FavoriteId, FavoriteProperty>,
    alerts: HashMap<AlertSubscriptionId, PropertySubscription>,
    leads: HashMap<LeadId, Lead>,
    viewings: HashMap<ViewingId, PropertyViewing>,
    messages: HashMap<MessageId, Message>,
    notifications: HashMap<NotificationId, Notification>,
    preferences: HashMap<UserId, NotificationPreference>,
    plans: BTreeMap<SubscriptionPlan, PlanConfig>,
    subscriptions: HashMap<SubscriptionId, AgentSubscription>,
    payments: HashMap<String, Payment>,
    featured: HashMap<FeaturedListingId, FeaturedListing>,
}

/// Process-local store implementing every repository trait over one lock.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the default plan catalogue.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for plan in PlanConfig::seeded() {
            tables.plans.insert(plan.plan, plan);
        }
        Self {
            tables: Mutex::new(tables),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate an outage: every call fails with `Unavailable` until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("store offline".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

fn replace<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> Result<(), RepositoryError>
where
    K: std::hash::Hash + Eq,
{
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(RepositoryError::NotFound),
    }
}

impl AccountRepository for MemoryStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict("user with this email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.users, user.id, user)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn user_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.tables()?.user_profiles.get(&id).cloned())
    }

    fn upsert_user_profile(&self, profile: UserProfile) -> Result<(), RepositoryError> {
        self.tables()?.user_profiles.insert(profile.user_id, profile);
        Ok(())
    }

    fn upsert_agent_profile(&self, profile: AgentProfile) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if let Some(license) = &profile.license_number {
            let taken = tables.agent_profiles.values().any(|other| {
                other.user_id != profile.user_id
                    && other.license_number.as_deref() == Some(license.as_str())
            });
            if taken {
                return Err(RepositoryError::Conflict("agent with this license number"));
            }
        }
        tables.agent_profiles.insert(profile.user_id, profile);
        Ok(())
    }

    fn agent_profile(&self, id: UserId) -> Result<Option<AgentProfile>, RepositoryError> {
        Ok(self.tables()?.agent_profiles.get(&id).cloned())
    }

    fn agent_profiles(&self) -> Result<Vec<AgentProfile>, RepositoryError> {
        Ok(self.tables()?.agent_profiles.values().cloned().collect())
    }
}

impl ListingRepository for MemoryStore {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.properties.values().any(|other| other.slug == property.slug) {
            return Err(RepositoryError::Conflict("property with this slug"));
        }
        tables.properties.insert(property.id, property.clone());
        Ok(property)
    }

    fn update_property(&self, property: Property) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.properties, property.id, property)
    }

    fn property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(self.tables()?.properties.get(&id).cloned())
    }

    fn property_by_slug(&self, slug: &str) -> Result<Option<Property>, RepositoryError> {
        Ok(self
            .tables()?
            .properties
            .values()
            .find(|property| property.slug == slug)
            .cloned())
    }

    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        Ok(self.tables()?.properties.values().cloned().collect())
    }

    fn delete_property(&self, id: PropertyId) -> Result<Property, RepositoryError> {
        let mut tables = self.tables()?;
        let property = tables
            .properties
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;

        tables.images.retain(|_, image| image.property_id != id);
        tables.favorites.retain(|_, favorite| favorite.property_id != id);
        tables.leads.retain(|_, lead| lead.property_id != id);
        tables.viewings.retain(|_, viewing| viewing.property_id != id);
        tables.featured.retain(|_, boost| boost.property != id);
        for message in tables.messages.values_mut() {
            if message.property == Some(id) {
                message.property = None;
            }
        }
        for notification in tables.notifications.values_mut() {
            if notification.property == Some(id) {
                notification.property = None;
            }
        }
        Ok(property)
    }

    fn custom_property_types(&self) -> Result<Vec<PropertyType>, RepositoryError> {
        Ok(self.tables()?.custom_types.clone())
    }

    fn insert_custom_property_type(&self, kind: PropertyType) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.custom_types.iter().any(|known| known.same_as(&kind)) {
            tables.custom_types.push(kind);
        }
        Ok(())
    }

    fn insert_image(&self, image: PropertyImage) -> Result<PropertyImage, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.properties.contains_key(&image.property_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.images.insert(image.id, image.clone());
        Ok(image)
    }

    fn image(&self, id: ImageId) -> Result<Option<PropertyImage>, RepositoryError> {
        Ok(self.tables()?.images.get(&id).cloned())
    }

    fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError> {
        self.tables()?
            .images
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn images_for(&self, property: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError> {
        Ok(self
            .tables()?
            .images
            .values()
            .filter(|image| image.property_id == property)
            .cloned()
            .collect())
    }

    fn insert_amenity(&self, amenity: Amenity) -> Result<Amenity, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .amenities
            .values()
            .any(|other| other.name.eq_ignore_ascii_case(&amenity.name))
        {
            return Err(RepositoryError::Conflict("amenity with this name"));
        }
        tables.amenities.insert(amenity.id, amenity.clone());
        Ok(amenity)
    }

    fn amenities(&self) -> Result<Vec<Amenity>, RepositoryError> {
        Ok(self.tables()?.amenities.values().cloned().collect())
    }

    fn insert_favorite(
        &self,
        favorite: FavoriteProperty,
    ) -> Result<FavoriteProperty, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.favorites.values().any(|other| {
            other.user_id == favorite.user_id && other.property_id == favorite.property_id
        }) {
            return Err(RepositoryError::Conflict("favorite for this property"));
        }
        tables.favorites.insert(favorite.id, favorite.clone());
        Ok(favorite)
    }

    fn favorite(&self, id: FavoriteId) -> Result<Option<FavoriteProperty>, RepositoryError> {
        Ok(self.tables()?.favorites.get(&id).cloned())
    }

    fn favorite_for(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<Option<FavoriteProperty>, RepositoryError> {
        Ok(self
            .tables()?
            .favorites
            .values()
            .find(|favorite| favorite.user_id == user && favorite.property_id == property)
            .cloned())
    }

    fn delete_favorite(&self, id: FavoriteId) -> Result<(), RepositoryError> {
        self.tables()?
            .favorites
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn favorites_for_user(&self, user: UserId) -> Result<Vec<FavoriteProperty>, RepositoryError> {
        Ok(self
            .tables()?
            .favorites
            .values()
            .filter(|favorite| favorite.user_id == user)
            .cloned()
            .collect())
    }

    fn favorites_for_property(
        &self,
        property: PropertyId,
    ) -> Result<Vec<FavoriteProperty>, RepositoryError> {
        Ok(self
            .tables()?
            .favorites
            .values()
            .filter(|favorite| favorite.property_id == property)
            .cloned()
            .collect())
    }

    fn insert_alert(
        &self,
        alert: PropertySubscription,
    ) -> Result<PropertySubscription, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.alerts.values().any(|other| other.same_criteria(&alert)) {
            return Err(RepositoryError::Conflict("alert with these criteria"));
        }
        tables.alerts.insert(alert.id, alert.clone());
        Ok(alert)
    }

    fn update_alert(&self, alert: PropertySubscription) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .alerts
            .values()
            .any(|other| other.id != alert.id && other.same_criteria(&alert))
        {
            return Err(RepositoryError::Conflict("alert with these criteria"));
        }
        replace(&mut tables.alerts, alert.id, alert)
    }

    fn alert(
        &self,
        id: AlertSubscriptionId,
    ) -> Result<Option<PropertySubscription>, RepositoryError> {
        Ok(self.tables()?.alerts.get(&id).cloned())
    }

    fn delete_alert(&self, id: AlertSubscriptionId) -> Result<(), RepositoryError> {
        self.tables()?
            .alerts
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn alerts(&self) -> Result<Vec<PropertySubscription>, RepositoryError> {
        Ok(self.tables()?.alerts.values().cloned().collect())
    }
}

impl LeadRepository for MemoryStore {
    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .leads
            .values()
            .any(|other| other.user_id == lead.user_id && other.property_id == lead.property_id)
        {
            return Err(RepositoryError::Conflict("lead for this property"));
        }
        tables.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    fn update_lead(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.leads, lead.id, lead)
    }

    fn lead(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        Ok(self.tables()?.leads.get(&id).cloned())
    }

    fn lead_for(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<Option<Lead>, RepositoryError> {
        Ok(self
            .tables()?
            .leads
            .values()
            .find(|lead| lead.user_id == user && lead.property_id == property)
            .cloned())
    }

    fn leads_for_user(&self, user: UserId) -> Result<Vec<Lead>, RepositoryError> {
        Ok(self
            .tables()?
            .leads
            .values()
            .filter(|lead| lead.user_id == user)
            .cloned()
            .collect())
    }

    fn leads_for_agent(&self, agent: UserId) -> Result<Vec<Lead>, RepositoryError> {
        Ok(self
            .tables()?
            .leads
            .values()
            .filter(|lead| lead.agent_id == agent)
            .cloned()
            .collect())
    }

    fn insert_viewing(&self, viewing: PropertyViewing) -> Result<PropertyViewing, RepositoryError> {
        let mut tables = self.tables()?;
        if slot_taken(&tables, &viewing) {
            return Err(RepositoryError::Conflict("viewing at this time"));
        }
        tables.viewings.insert(viewing.id, viewing.clone());
        Ok(viewing)
    }

    fn update_viewing(&self, viewing: PropertyViewing) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if slot_taken(&tables, &viewing) {
            return Err(RepositoryError::Conflict("viewing at this time"));
        }
        replace(&mut tables.viewings, viewing.id, viewing)
    }

    fn viewing(&self, id: ViewingId) -> Result<Option<PropertyViewing>, RepositoryError> {
        Ok(self.tables()?.viewings.get(&id).cloned())
    }

    fn viewings_for_lead(&self, lead: LeadId) -> Result<Vec<PropertyViewing>, RepositoryError> {
        Ok(self
            .tables()?
            .viewings
            .values()
            .filter(|viewing| viewing.lead_id == Some(lead))
            .cloned()
            .collect())
    }

    fn viewings(&self) -> Result<Vec<PropertyViewing>, RepositoryError> {
        Ok(self.tables()?.viewings.values().cloned().collect())
    }
}

fn slot_taken(tables: &Tables, viewing: &PropertyViewing) -> bool {
    viewing.status.holds_slot()
        && tables.viewings.values().any(|other| {
            other.id != viewing.id
                && other.property_id == viewing.property_id
                && other.scheduled_time == viewing.scheduled_time
                && other.status.holds_slot()
        })
}

impl MessagingRepository for MemoryStore {
    fn insert_message(&self, message: Message) -> Result<Message, RepositoryError> {
        self.tables()?.messages.insert(message.id, message.clone());
        Ok(message)
    }

    fn update_message(&self, message: Message) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.messages, message.id, message)
    }

    fn message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self.tables()?.messages.get(&id).cloned())
    }

    fn delete_message(&self, id: MessageId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.messages.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let mut orphans = vec![id];
        while let Some(parent) = orphans.pop() {
            let children: Vec<MessageId> = tables
                .messages
                .values()
                .filter(|message| message.parent == Some(parent))
                .map(|message| message.id)
                .collect();
            for child in children {
                tables.messages.remove(&child);
                orphans.push(child);
            }
        }
        Ok(())
    }

    fn messages_involving(&self, user: UserId) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .tables()?
            .messages
            .values()
            .filter(|message| message.involves(user))
            .cloned()
            .collect())
    }

    fn replies_to(&self, parent: MessageId) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .tables()?
            .messages
            .values()
            .filter(|message| message.parent == Some(parent))
            .cloned()
            .collect())
    }

    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError> {
        self.tables()?
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    fn update_notification(&self, notification: Notification) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.notifications, notification.id, notification)
    }

    fn notification(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError> {
        Ok(self.tables()?.notifications.get(&id).cloned())
    }

    fn delete_notification(&self, id: NotificationId) -> Result<(), RepositoryError> {
        self.tables()?
            .notifications
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn notifications_for(&self, user: UserId) -> Result<Vec<Notification>, RepositoryError> {
        Ok(self
            .tables()?
            .notifications
            .values()
            .filter(|notification| notification.user == user)
            .cloned()
            .collect())
    }

    fn preferences(&self, user: UserId) -> Result<Option<NotificationPreference>, RepositoryError> {
        Ok(self.tables()?.preferences.get(&user).copied())
    }

    fn upsert_preferences(
        &self,
        preferences: NotificationPreference,
    ) -> Result<(), RepositoryError> {
        self.tables()?
            .preferences
            .insert(preferences.user, preferences);
        Ok(())
    }
}

impl BillingRepository for MemoryStore {
    fn plans(&self) -> Result<Vec<PlanConfig>, RepositoryError> {
        Ok(self.tables()?.plans.values().cloned().collect())
    }

    fn plan(&self, plan: SubscriptionPlan) -> Result<Option<PlanConfig>, RepositoryError> {
        Ok(self.tables()?.plans.get(&plan).cloned())
    }

    fn upsert_plan(&self, plan: PlanConfig) -> Result<(), RepositoryError> {
        self.tables()?.plans.insert(plan.plan, plan);
        Ok(())
    }

    fn insert_subscription(
        &self,
        subscription: AgentSubscription,
    ) -> Result<AgentSubscription, RepositoryError> {
        self.tables()?
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    fn update_subscription(&self, subscription: AgentSubscription) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.subscriptions, subscription.id, subscription)
    }

    fn subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<Option<AgentSubscription>, RepositoryError> {
        Ok(self.tables()?.subscriptions.get(&id).cloned())
    }

    fn subscriptions_for(&self, agent: UserId) -> Result<Vec<AgentSubscription>, RepositoryError> {
        Ok(self
            .tables()?
            .subscriptions
            .values()
            .filter(|subscription| subscription.agent == agent)
            .cloned()
            .collect())
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.payments.contains_key(&payment.reference) {
            return Err(RepositoryError::Conflict("payment with this reference"));
        }
        tables
            .payments
            .insert(payment.reference.clone(), payment.clone());
        Ok(payment)
    }

    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let reference = payment.reference.clone();
        replace(&mut tables.payments, reference, payment)
    }

    fn payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.tables()?.payments.get(reference).cloned())
    }

    fn insert_featured(
        &self,
        listing: FeaturedListing,
    ) -> Result<FeaturedListing, RepositoryError> {
        self.tables()?.featured.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn update_featured(&self, listing: FeaturedListing) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace(&mut tables.featured, listing.id, listing)
    }

    fn featured_listings(&self) -> Result<Vec<FeaturedListing>, RepositoryError> {
        Ok(self.tables()?.featured.values().cloned().collect())
    }
}

/// Mailer that records messages instead of sending them.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: bool,
}

impl MemoryMailer {
    /// A mailer whose transport always fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|email| email.subject).collect()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Transport("memory mailer offline".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("mailer lock poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}
