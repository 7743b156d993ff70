use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    FavoriteLeadRequest, Lead, LeadDetail, LeadReceipt, LeadRequest, LeadStatus,
    LeadStatusUpdate, LeadUpdate, PropertyViewing, ViewingRequest, ViewingStatus,
    ViewingStatusUpdate,
};
use super::repository::LeadRepository;
use crate::accounts::service::approved_agent;
use crate::accounts::{AccountError, AccountRepository, Actor, User};
use crate::error::FieldError;
use crate::listings::{ListingRepository, Property};
use crate::messaging::{NotificationDraft, NotificationKind, Notifier};
use crate::shared::{FavoriteId, LeadId, Page, PropertyId, UserId, ViewingId};
use crate::store::RepositoryError;

pub const LEADS_PER_PAGE: usize = 10;

/// Service backing lead capture, the lead pipeline and viewing scheduling.
pub struct LeadService {
    repository: Arc<dyn LeadRepository>,
    listings: Arc<dyn ListingRepository>,
    accounts: Arc<dyn AccountRepository>,
    notifier: Arc<Notifier>,
}

impl LeadService {
    pub fn new(
        repository: Arc<dyn LeadRepository>,
        listings: Arc<dyn ListingRepository>,
        accounts: Arc<dyn AccountRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            repository,
            listings,
            accounts,
            notifier,
        }
    }

    /// Record a customer's interest. A repeat inquiry returns the existing
    /// lead with `created == false`.
    pub fn create_lead(
        &self,
        actor: &Actor,
        request: LeadRequest,
        now: DateTime<Utc>,
    ) -> Result<LeadReceipt, LeadError> {
        if !actor.is_customer() {
            return Err(LeadError::Forbidden);
        }
        let message = request.message.trim();
        if message.is_empty() {
            return Err(FieldError::new("message", "Message is required.").into());
        }
        let property = self
            .listings
            .property(request.property_id)?
            .ok_or(LeadError::NotFound)?;

        if let Some(lead) = self.repository.lead_for(actor.user_id, property.id)? {
            return Ok(LeadReceipt {
                lead,
                created: false,
            });
        }

        let inserted = self.repository.insert_lead(Lead {
            id: LeadId::new(),
            agent_id: property.agent_id,
            user_id: actor.user_id,
            property_id: property.id,
            scheduled_viewing: None,
            message: message.to_string(),
            notes: request.notes.trim().to_string(),
            last_contact: None,
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        });
        let lead = match inserted {
            Ok(lead) => lead,
            Err(RepositoryError::Conflict(_)) => {
                let lead = self
                    .repository
                    .lead_for(actor.user_id, property.id)?
                    .ok_or(LeadError::NotFound)?;
                return Ok(LeadReceipt {
                    lead,
                    created: false,
                });
            }
            Err(err) => return Err(err.into()),
        };

        info!(lead = %lead.id, property = %property.id, "lead captured");
        self.announce_lead(&lead, &property, now);
        Ok(LeadReceipt {
            lead,
            created: true,
        })
    }

    pub fn create_lead_from_favorite(
        &self,
        actor: &Actor,
        favorite: FavoriteId,
        request: FavoriteLeadRequest,
        now: DateTime<Utc>,
    ) -> Result<LeadReceipt, LeadError> {
        if !actor.is_customer() {
            return Err(LeadError::Forbidden);
        }
        let favorite = self
            .listings
            .favorite(favorite)?
            .filter(|favorite| favorite.user_id == actor.user_id)
            .ok_or(LeadError::NotFound)?;
        self.create_lead(
            actor,
            LeadRequest {
                property_id: favorite.property_id,
                message: request.message,
                notes: request.notes,
            },
            now,
        )
    }

    /// Customers see their own leads and agents the leads on their listings.
    pub fn list_leads(&self, actor: &Actor, page: Option<&str>) -> Result<Page<Lead>, LeadError> {
        let mut leads = if actor.is_customer() {
            self.repository.leads_for_user(actor.user_id)?
        } else if actor.is_agent() {
            self.repository.leads_for_agent(actor.user_id)?
        } else {
            return Err(LeadError::Forbidden);
        };
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::paginate(leads, page, LEADS_PER_PAGE))
    }

    pub fn lead_detail(
        &self,
        actor: &Actor,
        id: LeadId,
        now: DateTime<Utc>,
    ) -> Result<LeadDetail, LeadError> {
        let lead = self.visible_lead(actor, id)?;
        let property_title = self
            .listings
            .property(lead.property_id)?
            .map(|property| property.title)
            .unwrap_or_default();

        let mut viewings = self.repository.viewings_for_lead(lead.id)?;
        viewings.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
        let upcoming_viewing = viewings
            .iter()
            .find(|viewing| viewing.status.holds_slot() && viewing.scheduled_time >= now)
            .cloned();

        Ok(LeadDetail {
            lead,
            property_title,
            viewings,
            upcoming_viewing,
        })
    }

    pub fn update_lead(
        &self,
        actor: &Actor,
        id: LeadId,
        update: LeadUpdate,
        now: DateTime<Utc>,
    ) -> Result<Lead, LeadError> {
        let mut lead = self.repository.lead(id)?.ok_or(LeadError::NotFound)?;
        if !(actor.is_staff || (actor.is_agent() && lead.agent_id == actor.user_id)) {
            return Err(LeadError::Forbidden);
        }
        if let Some(message) = update.message {
            let message = message.trim();
            if message.is_empty() {
                return Err(FieldError::new("message", "Message is required.").into());
            }
            lead.message = message.to_string();
        }
        if let Some(notes) = update.notes {
            lead.notes = notes.trim().to_string();
        }
        lead.updated_at = now;
        self.repository.update_lead(lead.clone())?;
        Ok(lead)
    }

    pub fn update_lead_status(
        &self,
        actor: &Actor,
        id: LeadId,
        update: LeadStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<Lead, LeadError> {
        let mut lead = self.assigned_lead(actor, id)?;
        let next = update.status;
        if !lead.status.can_transition_to(next) {
            return Err(LeadError::InvalidTransition {
                from: lead.status,
                to: next,
            });
        }
        if next == LeadStatus::ViewingScheduled
            && lead.status != next
            && self.repository.viewings_for_lead(lead.id)?.is_empty()
        {
            return Err(FieldError::new(
                "status",
                "Schedule a viewing before marking the lead as viewing scheduled.",
            )
            .into());
        }

        if next == LeadStatus::Contacted && lead.status != next {
            lead.last_contact = Some(now);
        }
        if let Some(notes) = update.notes {
            lead.notes = notes.trim().to_string();
        }
        lead.status = next;
        lead.updated_at = now;
        self.repository.update_lead(lead.clone())?;
        info!(lead = %lead.id, status = next.key(), "lead status updated");
        Ok(lead)
    }

    pub fn schedule_viewing(
        &self,
        actor: &Actor,
        lead: LeadId,
        request: ViewingRequest,
        now: DateTime<Utc>,
    ) -> Result<PropertyViewing, LeadError> {
        approved_agent(self.accounts.as_ref(), actor)?;
        let mut lead = self.assigned_lead(actor, lead)?;
        if request.scheduled_time < now {
            return Err(FieldError::new(
                "scheduled_time",
                "Viewing time cannot be in the past.",
            )
            .into());
        }
        if !lead.status.can_transition_to(LeadStatus::ViewingScheduled) {
            return Err(LeadError::InvalidTransition {
                from: lead.status,
                to: LeadStatus::ViewingScheduled,
            });
        }

        let viewing = self.repository.insert_viewing(PropertyViewing {
            id: ViewingId::new(),
            user_id: lead.user_id,
            property_id: lead.property_id,
            lead_id: Some(lead.id),
            scheduled_time: request.scheduled_time,
            status: ViewingStatus::Pending,
            notes: request.notes.trim().to_string(),
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        })?;

        lead.status = LeadStatus::ViewingScheduled;
        lead.scheduled_viewing = Some(viewing.scheduled_time);
        lead.updated_at = now;
        self.repository.update_lead(lead.clone())?;

        info!(lead = %lead.id, viewing = %viewing.id, "viewing scheduled");
        self.announce_viewing(&lead, &viewing, now);
        Ok(viewing)
    }

    pub fn update_viewing_status(
        &self,
        actor: &Actor,
        id: ViewingId,
        update: ViewingStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<PropertyViewing, LeadError> {
        let mut viewing = self.repository.viewing(id)?.ok_or(LeadError::NotFound)?;
        let property = self.listings.property(viewing.property_id)?;
        let lead = match viewing.lead_id {
            Some(lead) => self.repository.lead(lead)?,
            None => None,
        };
        let agent = lead
            .as_ref()
            .map(|lead| lead.agent_id)
            .or(property.as_ref().map(|property| property.agent_id));
        if !actor.is_agent() || agent != Some(actor.user_id) {
            return Err(LeadError::Forbidden);
        }

        let next = update.status;
        if !viewing.status.can_transition_to(next) {
            return Err(LeadError::InvalidViewingTransition {
                from: viewing.status,
                to: next,
            });
        }
        let reason = update
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        if next == ViewingStatus::Cancelled {
            match reason {
                Some(reason) => viewing.cancellation_reason = Some(reason),
                None => {
                    return Err(FieldError::new(
                        "reason",
                        "A reason is required to cancel a viewing.",
                    )
                    .into())
                }
            }
        }

        viewing.status = next;
        viewing.updated_at = now;
        self.repository.update_viewing(viewing.clone())?;

        if let Some(mut lead) = lead {
            if next == ViewingStatus::Completed {
                if lead.status.can_transition_to(LeadStatus::FollowUp) {
                    lead.status = LeadStatus::FollowUp;
                    lead.updated_at = now;
                    self.repository.update_lead(lead)?;
                } else {
                    warn!(
                        lead = %lead.id,
                        status = lead.status.key(),
                        "lead not moved to follow up"
                    );
                }
            }
        }

        let title = property
            .map(|property| property.title)
            .unwrap_or_default();
        self.announce_viewing_update(&viewing, agent, &title, now);
        Ok(viewing)
    }

    /// A customer's own viewings, or those on an agent's listings.
    pub fn viewings_for_user(&self, actor: &Actor) -> Result<Vec<PropertyViewing>, LeadError> {
        let mut viewings = if actor.is_customer() {
            self.repository
                .viewings()?
                .into_iter()
                .filter(|viewing| viewing.user_id == actor.user_id)
                .collect::<Vec<_>>()
        } else if actor.is_agent() {
            let owned: Vec<PropertyId> = self
                .listings
                .properties()?
                .into_iter()
                .filter(|property| property.agent_id == actor.user_id)
                .map(|property| property.id)
                .collect();
            self.repository
                .viewings()?
                .into_iter()
                .filter(|viewing| owned.contains(&viewing.property_id))
                .collect()
        } else {
            return Err(LeadError::Forbidden);
        };
        viewings.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
        Ok(viewings)
    }

    fn visible_lead(&self, actor: &Actor, id: LeadId) -> Result<Lead, LeadError> {
        let lead = self.repository.lead(id)?.ok_or(LeadError::NotFound)?;
        let visible = actor.is_staff
            || (actor.is_customer() && lead.user_id == actor.user_id)
            || (actor.is_agent() && lead.agent_id == actor.user_id);
        if !visible {
            return Err(LeadError::NotFound);
        }
        Ok(lead)
    }

    fn assigned_lead(&self, actor: &Actor, id: LeadId) -> Result<Lead, LeadError> {
        if !actor.is_agent() {
            return Err(LeadError::Forbidden);
        }
        let lead = self.repository.lead(id)?.ok_or(LeadError::NotFound)?;
        if lead.agent_id != actor.user_id {
            return Err(LeadError::Forbidden);
        }
        Ok(lead)
    }

    fn parties(&self, lead: &Lead) -> Option<(User, User)> {
        let lookup = || -> Result<Option<(User, User)>, RepositoryError> {
            let customer = self.accounts.user(lead.user_id)?;
            let agent = self.accounts.user(lead.agent_id)?;
            Ok(customer.zip(agent))
        };
        match lookup() {
            Ok(Some(parties)) => Some(parties),
            Ok(None) => {
                warn!(lead = %lead.id, "lead participants missing");
                None
            }
            Err(err) => {
                warn!(lead = %lead.id, error = %err, "could not load lead participants");
                None
            }
        }
    }

    fn announce_lead(&self, lead: &Lead, property: &Property, now: DateTime<Utc>) {
        let Some((customer, agent)) = self.parties(lead) else {
            return;
        };
        let postman = self.notifier.postman();
        postman.deliver(
            &agent.email,
            &format!("New Lead: {}", property.title),
            format!(
                "Hi {},\n\n{} ({}) is interested in {}.\n\n{}\n\n{}",
                agent.name,
                customer.name,
                customer.email,
                property.title,
                lead.message,
                postman.config().link(&format!("/leads/{}", lead.id)),
            ),
        );
        postman.deliver(
            &customer.email,
            &format!("Your inquiry about {}", property.title),
            format!(
                "Hi {},\n\nThanks for your interest in {}. {} will be in touch soon.",
                customer.name, property.title, agent.name
            ),
        );

        let draft = NotificationDraft::new(
            agent.id,
            NotificationKind::NewLead,
            format!("New Lead from {}", customer.name),
            format!("Interested in {}", property.title),
        )
        .property(property.id)
        .link(format!("/leads/{}", lead.id))
        .meta("lead_id", lead.id)
        .meta("property_id", property.id);
        self.notifier.notify_quietly(draft, now);
    }

    fn announce_viewing(&self, lead: &Lead, viewing: &PropertyViewing, now: DateTime<Utc>) {
        let Some((customer, agent)) = self.parties(lead) else {
            return;
        };
        let title = match self.listings.property(lead.property_id) {
            Ok(Some(property)) => property.title,
            _ => String::new(),
        };
        let when = viewing.scheduled_time.format("%Y-%m-%d %H:%M UTC");
        let postman = self.notifier.postman();
        postman.deliver(
            &customer.email,
            &format!("Viewing Scheduled: {title}"),
            format!(
                "Hi {},\n\nA viewing of {title} has been scheduled for {when} with {}.",
                customer.name, agent.name
            ),
        );
        postman.deliver(
            &agent.email,
            &format!("Viewing Scheduled for Lead: {}", customer.name),
            format!(
                "Hi {},\n\nYou have a viewing of {title} with {} on {when}.",
                agent.name, customer.name
            ),
        );

        let draft = NotificationDraft::new(
            agent.id,
            NotificationKind::Viewing,
            format!("Viewing Scheduled for {}", customer.name),
            format!("{} has a scheduled viewing for {title}.", customer.name),
        )
        .property(lead.property_id)
        .link(format!("/leads/{}", lead.id))
        .meta("viewing_id", viewing.id)
        .meta("lead_id", lead.id)
        .meta("property_id", lead.property_id);
        self.notifier.notify_quietly(draft, now);
    }

    fn announce_viewing_update(
        &self,
        viewing: &PropertyViewing,
        agent: Option<UserId>,
        title: &str,
        now: DateTime<Utc>,
    ) {
        let label = viewing.status.label();
        let subject = format!("Viewing Update: {title}");
        let body = format!("Viewing status changed to {label}");
        let postman = self.notifier.postman();

        let mut recipients = vec![viewing.user_id];
        recipients.extend(agent);
        for recipient in recipients {
            match self.accounts.user(recipient) {
                Ok(Some(user)) => {
                    postman.deliver(&user.email, &subject, body.clone());
                }
                Ok(None) => {}
                Err(err) => warn!(user = %recipient, error = %err, "viewing update email skipped"),
            }
        }

        let mut message = format!("Your viewing for {title} is now {label}.");
        if let Some(reason) = &viewing.cancellation_reason {
            message.push_str(&format!(" Reason: {reason}"));
        }
        let draft = NotificationDraft::new(
            viewing.user_id,
            NotificationKind::ViewingUpdate,
            format!("Viewing {label}"),
            message,
        )
        .property(viewing.property_id)
        .meta("viewing_id", viewing.id);
        self.notifier.notify_quietly(draft, now);
    }
}

/// Error raised by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("you do not have permission to manage this lead")]
    Forbidden,
    #[error("lead or viewing not found")]
    NotFound,
    #[error("cannot move a lead from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: LeadStatus, to: LeadStatus },
    #[error("cannot move a viewing from {} to {}", .from.label(), .to.label())]
    InvalidViewingTransition {
        from: ViewingStatus,
        to: ViewingStatus,
    },
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
