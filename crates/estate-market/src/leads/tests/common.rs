pub(super) use crate::test_support::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::accounts::Actor;
use crate::config::MailConfig;
use crate::leads::{
    Lead, LeadRepository, LeadRequest, LeadService, PropertyViewing, ViewingRequest,
};
use crate::listings::Property;
use crate::mail::Postman;
use crate::messaging::Notifier;
use crate::shared::{LeadId, PropertyId, UserId, ViewingId};
use crate::store::RepositoryError;

pub(super) struct LeadScene {
    pub(super) fixture: Fixture,
    pub(super) agent: Actor,
    pub(super) customer: Actor,
    pub(super) property: Property,
    pub(super) lead: Lead,
}

/// An approved agent with one listing and one customer inquiry on it.
pub(super) fn scene() -> LeadScene {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    let property = fixture.property(&agent, "Garden flat");
    let lead = fixture
        .market
        .leads()
        .create_lead(&customer, inquiry(property.id), now())
        .expect("create lead")
        .lead;
    LeadScene {
        fixture,
        agent,
        customer,
        property,
        lead,
    }
}

pub(super) fn inquiry(property: PropertyId) -> LeadRequest {
    LeadRequest {
        property_id: property,
        message: "I would like to see this place.".to_string(),
        notes: String::new(),
    }
}

pub(super) fn in_days(days: i64) -> DateTime<Utc> {
    now() + Duration::days(days)
}

pub(super) fn viewing_at(time: DateTime<Utc>) -> ViewingRequest {
    ViewingRequest {
        scheduled_time: time,
        notes: "Meet at the gate".to_string(),
    }
}

/// Lead storage whose first duplicate lookup misses, as when two inquiries
/// for the same listing race past the check.
pub(super) struct RacingLeads {
    inner: Arc<dyn LeadRepository>,
    missed: AtomicBool,
}

impl LeadRepository for RacingLeads {
    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        self.inner.insert_lead(lead)
    }
    fn update_lead(&self, lead: Lead) -> Result<(), RepositoryError> {
        self.inner.update_lead(lead)
    }
    fn lead(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        self.inner.lead(id)
    }
    fn lead_for(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<Option<Lead>, RepositoryError> {
        if !self.missed.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.lead_for(user, property)
    }
    fn leads_for_user(&self, user: UserId) -> Result<Vec<Lead>, RepositoryError> {
        self.inner.leads_for_user(user)
    }
    fn leads_for_agent(&self, agent: UserId) -> Result<Vec<Lead>, RepositoryError> {
        self.inner.leads_for_agent(agent)
    }
    fn insert_viewing(&self, viewing: PropertyViewing) -> Result<PropertyViewing, RepositoryError> {
        self.inner.insert_viewing(viewing)
    }
    fn update_viewing(&self, viewing: PropertyViewing) -> Result<(), RepositoryError> {
        self.inner.update_viewing(viewing)
    }
    fn viewing(&self, id: ViewingId) -> Result<Option<PropertyViewing>, RepositoryError> {
        self.inner.viewing(id)
    }
    fn viewings_for_lead(&self, lead: LeadId) -> Result<Vec<PropertyViewing>, RepositoryError> {
        self.inner.viewings_for_lead(lead)
    }
    fn viewings(&self) -> Result<Vec<PropertyViewing>, RepositoryError> {
        self.inner.viewings()
    }
}

/// A lead service over the scene's store that loses the duplicate check once.
pub(super) fn racing_leads(fixture: &Fixture) -> LeadService {
    let notifier = Arc::new(Notifier::new(
        fixture.store.clone(),
        fixture.store.clone(),
        Postman::new(fixture.mailer.clone(), MailConfig::default()),
    ));
    LeadService::new(
        Arc::new(RacingLeads {
            inner: fixture.store.clone(),
            missed: AtomicBool::new(false),
        }),
        fixture.store.clone(),
        fixture.store.clone(),
        notifier,
    )
}
