//! Users, customer and agent profiles, agent approval and dashboards.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AccountOverview, Actor, AgentContactRequest, AgentDashboard, AgentDetail, AgentProfile,
    AgentProfileUpdate, AgentSummary, AgentType, CustomerDashboard, NameUpdate, SignupReceipt,
    SignupRequest, SocialLinks, User, UserProfile, UserProfileUpdate, UserRole,
    VerificationRequest,
};
pub use repository::AccountRepository;
pub use router::account_router;
pub use service::{AccountError, AccountService};
