//! Customer inquiries and the agent's follow-up pipeline, including viewing
//! appointments.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    FavoriteLeadRequest, Lead, LeadDetail, LeadReceipt, LeadRequest, LeadStatus,
    LeadStatusUpdate, LeadUpdate, PropertyViewing, ViewingRequest, ViewingStatus,
    ViewingStatusUpdate,
};
pub use repository::LeadRepository;
pub use router::lead_router;
pub use service::{LeadError, LeadService, LEADS_PER_PAGE};
