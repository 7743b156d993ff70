use super::domain::{Lead, PropertyViewing};
use crate::shared::{LeadId, PropertyId, UserId, ViewingId};
use crate::store::RepositoryError;

/// Storage abstraction for leads and viewings.
pub trait LeadRepository: Send + Sync {
    /// Atomic check-and-insert: `Conflict` when the user already has a lead
    /// on the property.
    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError>;
    fn update_lead(&self, lead: Lead) -> Result<(), RepositoryError>;
    fn lead(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError>;
    fn lead_for(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<Option<Lead>, RepositoryError>;
    fn leads_for_user(&self, user: UserId) -> Result<Vec<Lead>, RepositoryError>;
    fn leads_for_agent(&self, agent: UserId) -> Result<Vec<Lead>, RepositoryError>;

    /// `Conflict` when another pending or confirmed viewing holds the same
    /// property and time.
    fn insert_viewing(&self, viewing: PropertyViewing) -> Result<PropertyViewing, RepositoryError>;
    fn update_viewing(&self, viewing: PropertyViewing) -> Result<(), RepositoryError>;
    fn viewing(&self, id: ViewingId) -> Result<Option<PropertyViewing>, RepositoryError>;
    fn viewings_for_lead(&self, lead: LeadId) -> Result<Vec<PropertyViewing>, RepositoryError>;
    fn viewings(&self) -> Result<Vec<PropertyViewing>, RepositoryError>;
}
