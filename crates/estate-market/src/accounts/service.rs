use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    clean_optional, clean_phone, AccountOverview, Actor, AgentContactRequest, AgentDashboard,
    AgentDetail, AgentProfile, AgentProfileUpdate, AgentSummary, CustomerDashboard,
    SignupReceipt, SignupRequest, User, UserProfile, UserProfileUpdate, UserRole, MAX_PHONE_LEN,
};
use super::repository::AccountRepository;
use crate::auth::{AuthError, TokenAuthority};
use crate::billing::{BillingError, BillingService};
use crate::error::FieldError;
use crate::leads::{LeadRepository, LeadStatus};
use crate::listings::{ListingRepository, PropertyCard};
use crate::messaging::{MessagingRepository, Notifier};
use crate::shared::{looks_like_email, Page, UserId};
use crate::store::RepositoryError;

pub const AGENTS_PER_PAGE: usize = 10;
pub const AGENT_PROPERTIES_PER_PAGE: usize = 6;
const MAX_CONTACT_PHONE_LEN: usize = 20;

/// Service backing signup, profiles, agent approval and dashboards.
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    listings: Arc<dyn ListingRepository>,
    leads: Arc<dyn LeadRepository>,
    messaging: Arc<dyn MessagingRepository>,
    notifier: Arc<Notifier>,
    billing: Arc<BillingService>,
    tokens: TokenAuthority,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        listings: Arc<dyn ListingRepository>,
        leads: Arc<dyn LeadRepository>,
        messaging: Arc<dyn MessagingRepository>,
        notifier: Arc<Notifier>,
        billing: Arc<BillingService>,
        tokens: TokenAuthority,
    ) -> Self {
        Self {
            repository,
            listings,
            leads,
            messaging,
            notifier,
            billing,
            tokens,
        }
    }

    pub fn signup(
        &self,
        request: SignupRequest,
        now: DateTime<Utc>,
    ) -> Result<SignupReceipt, AccountError> {
        let (email, name) = request.validate()?;
        let user = self.repository.insert_user(User {
            id: UserId::new(),
            email,
            name,
            role: request.role,
            is_staff: false,
            created_at: now,
        })?;

        if user.is_agent() {
            self.repository
                .upsert_agent_profile(AgentProfile::new(user.id))?;
        } else {
            self.repository
                .upsert_user_profile(UserProfile::empty(user.id))?;
        }
        self.notifier.preferences_for(user.id)?;
        if user.is_agent() {
            self.billing.start_trial(user.id, now)?;
        }

        let token = self.tokens.issue(&user, now)?;
        info!(user = %user.id, role = ?user.role, "account created");
        Ok(SignupReceipt { user, token })
    }

    pub fn get_user(&self, actor: &Actor) -> Result<AccountOverview, AccountError> {
        let user = self.user(actor.user_id)?;
        Ok(AccountOverview {
            profile: self.repository.user_profile(user.id)?,
            agent_profile: self.repository.agent_profile(user.id)?,
            user,
        })
    }

    pub fn update_name(&self, actor: &Actor, name: &str) -> Result<User, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FieldError::new("name", "Name is required.").into());
        }
        let mut user = self.user(actor.user_id)?;
        user.name = name.to_string();
        self.repository.update_user(user.clone())?;
        Ok(user)
    }

    pub fn update_user_profile(
        &self,
        actor: &Actor,
        update: UserProfileUpdate,
    ) -> Result<UserProfile, AccountError> {
        let phone_number = clean_phone("phone_number", update.phone_number, MAX_PHONE_LEN)?;
        let mut profile = self
            .repository
            .user_profile(actor.user_id)?
            .unwrap_or_else(|| UserProfile::empty(actor.user_id));
        profile.phone_number = phone_number;
        profile.address = clean_optional(update.address);
        profile.social = update.social;
        self.repository.upsert_user_profile(profile.clone())?;
        Ok(profile)
    }

    /// Rating and verification are not editable here.
    pub fn update_agent_profile(
        &self,
        actor: &Actor,
        update: AgentProfileUpdate,
    ) -> Result<AgentProfile, AccountError> {
        let mut profile = self.agent_profile(actor)?;
        let office_phone = clean_phone("office_phone", update.office_phone, MAX_PHONE_LEN)?;

        if let Some(agent_type) = update.agent_type {
            profile.agent_type = agent_type;
        }
        profile.company_name = clean_optional(update.company_name);
        profile.license_number = clean_optional(update.license_number);
        profile.office_location = clean_optional(update.office_location);
        profile.office_phone = office_phone;
        profile.office_address = clean_optional(update.office_address);
        profile.description = clean_optional(update.description);
        profile.social = update.social;

        self.repository.upsert_agent_profile(profile.clone())?;
        Ok(profile)
    }

    /// Staff approval. Moving to verified e-mails the agent.
    pub fn verify_agent(
        &self,
        actor: &Actor,
        agent: UserId,
        verified: bool,
    ) -> Result<AgentProfile, AccountError> {
        if !actor.is_staff {
            return Err(AccountError::Forbidden);
        }
        let mut profile = self
            .repository
            .agent_profile(agent)?
            .ok_or(AccountError::NotFound)?;
        let newly_verified = verified && !profile.verified;
        profile.verified = verified;
        self.repository.upsert_agent_profile(profile.clone())?;

        if newly_verified {
            let user = self.user(agent)?;
            self.notifier.postman().deliver(
                &user.email,
                "Agent Profile Approved",
                concat!(
                    "Congratulations! Your agent profile has been verified. ",
                    "You can now list properties."
                )
                .to_string(),
            );
            info!(%agent, "agent approved");
        }
        Ok(profile)
    }

    pub fn list_verified_agents(
        &self,
        page: Option<&str>,
    ) -> Result<Page<AgentSummary>, AccountError> {
        let agents = verified_agents(self.repository.as_ref())?;
        Ok(Page::paginate(agents, page, AGENTS_PER_PAGE))
    }

    pub fn agent_detail(
        &self,
        agent: UserId,
        page: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AgentDetail, AccountError> {
        let profile = self
            .repository
            .agent_profile(agent)?
            .ok_or(AccountError::NotFound)?;
        let user = self.user(agent)?;
        let featured = self.billing.featured_property_ids(now)?;

        let mut owned: Vec<_> = self
            .listings
            .properties()?
            .into_iter()
            .filter(|property| property.agent_id == agent)
            .collect();
        let property_count = owned.len();
        owned.retain(|property| property.is_available);
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let cards = owned
            .iter()
            .map(|property| PropertyCard::new(property, featured.contains(&property.id)))
            .collect();

        Ok(AgentDetail {
            agent: AgentSummary::from_parts(&user, &profile),
            profile,
            property_count,
            properties: Page::paginate(cards, page, AGENT_PROPERTIES_PER_PAGE),
        })
    }

    /// Relay the contact form to the agent. Returns whether the e-mail went out.
    pub fn contact_agent(
        &self,
        agent: UserId,
        request: &AgentContactRequest,
    ) -> Result<bool, AccountError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(FieldError::new("name", "Name is required.").into());
        }
        if !looks_like_email(&request.email) {
            return Err(FieldError::new("email", "Enter a valid email address.").into());
        }
        let phone = clean_phone("phone", request.phone.clone(), MAX_CONTACT_PHONE_LEN)?;
        let message = request.message.trim();
        if message.is_empty() {
            return Err(FieldError::new("message", "Message is required.").into());
        }

        self.repository
            .agent_profile(agent)?
            .ok_or(AccountError::NotFound)?;
        let user = self.user(agent)?;
        let body = format!(
            "You received a message from a user on your agent profile page:\n\n\
             Name: {name}\nEmail: {}\nPhone: {}\n\nMessage:\n{message}",
            request.email.trim(),
            phone.as_deref().unwrap_or("not provided"),
        );
        Ok(self.notifier.postman().deliver_with_reply_to(
            &user.email,
            request.email.trim(),
            &format!("New inquiry from {name}"),
            body,
        ))
    }

    pub fn agent_dashboard(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<AgentDashboard, AccountError> {
        let profile = self.agent_profile(actor)?;
        let owned: Vec<_> = self
            .listings
            .properties()?
            .into_iter()
            .filter(|property| property.agent_id == actor.user_id)
            .collect();
        let leads = self.leads.leads_for_agent(actor.user_id)?;
        let leads_by_status = LeadStatus::ALL
            .iter()
            .map(|status| {
                let count = leads.iter().filter(|lead| lead.status == *status).count();
                (status.key().to_string(), count)
            })
            .collect();

        Ok(AgentDashboard {
            property_count: owned.len(),
            available_count: owned.iter().filter(|property| property.is_available).count(),
            leads_by_status,
            active_featured: self.billing.active_featured_count(actor.user_id, now)?,
            current_plan: self.billing.current_plan(actor.user_id, now)?,
            verified: profile.verified,
        })
    }

    pub fn customer_dashboard(&self, actor: &Actor) -> Result<CustomerDashboard, AccountError> {
        if !actor.is_customer() {
            return Err(AccountError::Forbidden);
        }
        let user = actor.user_id;
        let unread_notifications = self
            .messaging
            .notifications_for(user)?
            .iter()
            .filter(|notification| !notification.is_read)
            .count();
        let alert_subscriptions = self
            .listings
            .alerts()?
            .iter()
            .filter(|alert| alert.user_id == user)
            .count();

        Ok(CustomerDashboard {
            favorite_count: self.listings.favorites_for_user(user)?.len(),
            lead_count: self.leads.leads_for_user(user)?.len(),
            unread_notifications,
            alert_subscriptions,
        })
    }

    /// The caller's agent profile; rejects other roles.
    pub fn agent_profile(&self, actor: &Actor) -> Result<AgentProfile, AccountError> {
        if actor.role != Some(UserRole::Agent) {
            return Err(AccountError::Forbidden);
        }
        self.repository
            .agent_profile(actor.user_id)?
            .ok_or(AccountError::Forbidden)
    }

    fn user(&self, id: UserId) -> Result<User, AccountError> {
        self.repository.user(id)?.ok_or(AccountError::NotFound)
    }
}

/// Verified agents ordered by rating, best first.
pub(crate) fn verified_agents(
    accounts: &dyn AccountRepository,
) -> Result<Vec<AgentSummary>, RepositoryError> {
    let mut agents = Vec::new();
    for profile in accounts.agent_profiles()? {
        if !profile.verified {
            continue;
        }
        if let Some(user) = accounts.user(profile.user_id)? {
            agents.push(AgentSummary::from_parts(&user, &profile));
        }
    }
    agents.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(agents)
}

/// The caller's agent profile, which must exist and be verified.
pub(crate) fn approved_agent(
    accounts: &dyn AccountRepository,
    actor: &Actor,
) -> Result<AgentProfile, AccountError> {
    if !actor.is_agent() {
        return Err(AccountError::Forbidden);
    }
    let profile = accounts
        .agent_profile(actor.user_id)?
        .ok_or(AccountError::Forbidden)?;
    if !profile.verified {
        return Err(AccountError::AgentNotApproved);
    }
    Ok(profile)
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("you do not have permission to perform this action")]
    Forbidden,
    #[error("Your agent profile is awaiting approval.")]
    AgentNotApproved,
    #[error("account not found")]
    NotFound,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
