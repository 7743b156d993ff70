use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::SubscriptionPlan;
use crate::error::FieldError;
use crate::listings::PropertyCard;
use crate::shared::{looks_like_email, Page, SubscriptionId, UserId};

/// Which side of the marketplace an account acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Agent,
}

impl UserRole {
    pub fn label(self) -> &'static str {
        match self {
            UserRole::Customer => "Customer",
            UserRole::Agent => "Agent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Option<UserRole>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_agent(&self) -> bool {
        self.role == Some(UserRole::Agent)
    }

    pub fn is_customer(&self) -> bool {
        self.role == Some(UserRole::Customer)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            role: self.role,
            is_staff: self.is_staff,
        }
    }
}

/// Identity of the caller as carried by a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Option<UserRole>,
    pub is_staff: bool,
}

impl Actor {
    pub fn is_agent(&self) -> bool {
        self.role == Some(UserRole::Agent)
    }

    pub fn is_customer(&self) -> bool {
        self.role == Some(UserRole::Customer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub social: SocialLinks,
    pub is_premium: bool,
}

impl UserProfile {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            phone_number: None,
            address: None,
            social: SocialLinks::default(),
            is_premium: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    RealEstateAgent,
    #[default]
    PropertyManager,
}

impl AgentType {
    pub fn label(self) -> &'static str {
        match self {
            AgentType::RealEstateAgent => "Real Estate Agent",
            AgentType::PropertyManager => "Property Manager",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub user_id: UserId,
    pub agent_type: AgentType,
    pub company_name: Option<String>,
    pub license_number: Option<String>,
    pub office_location: Option<String>,
    pub office_phone: Option<String>,
    pub office_address: Option<String>,
    pub description: Option<String>,
    pub social: SocialLinks,
    pub rating: f32,
    pub verified: bool,
    pub current_subscription: Option<SubscriptionId>,
}

impl AgentProfile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            agent_type: AgentType::default(),
            company_name: None,
            license_number: None,
            office_location: None,
            office_phone: None,
            office_address: None,
            description: None,
            social: SocialLinks::default(),
            rating: 0.0,
            verified: false,
            current_subscription: None,
        }
    }
}

/// Signup payload. Credentials live with the upstream identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl SignupRequest {
    pub(crate) fn validate(&self) -> Result<(String, String), FieldError> {
        let email = self.email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Err(FieldError::new("email", "Email is required."));
        }
        if !looks_like_email(&email) {
            return Err(FieldError::new("email", "Enter a valid email address."));
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FieldError::new("name", "Name is required."));
        }
        Ok((email, name.to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfileUpdate {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentProfileUpdate {
    #[serde(default)]
    pub agent_type: Option<AgentType>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub office_location: Option<String>,
    #[serde(default)]
    pub office_phone: Option<String>,
    #[serde(default)]
    pub office_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
}

pub(crate) const MAX_PHONE_LEN: usize = 15;

/// Trim and drop blank optional text.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub(crate) fn clean_phone(
    field: &'static str,
    value: Option<String>,
    max_len: usize,
) -> Result<Option<String>, FieldError> {
    let phone = clean_optional(value);
    if let Some(phone) = &phone {
        if phone.chars().count() > max_len {
            return Err(FieldError::new(
                field,
                format!("Ensure this value has at most {max_len} characters."),
            ));
        }
    }
    Ok(phone)
}

/// Payload of the contact-agent form.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

/// Public view of an agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub agent_type: AgentType,
    pub company_name: Option<String>,
    pub office_location: Option<String>,
    pub rating: f32,
    pub verified: bool,
}

impl AgentSummary {
    pub fn from_parts(user: &User, profile: &AgentProfile) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            agent_type: profile.agent_type,
            company_name: profile.company_name.clone(),
            office_location: profile.office_location.clone(),
            rating: profile.rating,
            verified: profile.verified,
        }
    }
}

/// Returned by signup: the new account and a bearer token for it.
#[derive(Debug, Clone, Serialize)]
pub struct SignupReceipt {
    pub user: User,
    pub token: String,
}

/// The caller's account with whichever profiles it carries.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    pub user: User,
    pub profile: Option<UserProfile>,
    pub agent_profile: Option<AgentProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameUpdate {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentDetail {
    pub agent: AgentSummary,
    pub profile: AgentProfile,
    pub property_count: usize,
    pub properties: Page<PropertyCard>,
}

/// Everything the dashboard shows an agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDashboard {
    pub property_count: usize,
    pub available_count: usize,
    pub leads_by_status: Vec<(String, usize)>,
    pub active_featured: usize,
    pub current_plan: SubscriptionPlan,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDashboard {
    pub favorite_count: usize,
    pub lead_count: usize,
    pub unread_notifications: usize,
    pub alert_subscriptions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_lowercases_email_and_trims_name() {
        let request = SignupRequest {
            email: "  Ada@Example.COM ".to_string(),
            name: " Ada Obi ".to_string(),
            role: Some(UserRole::Customer),
        };
        let (email, name) = request.validate().expect("valid signup");
        assert_eq!(email, "ada@example.com");
        assert_eq!(name, "Ada Obi");
    }

    #[test]
    fn signup_rejects_malformed_email() {
        let request = SignupRequest {
            email: "not-an-email".to_string(),
            name: "Ada".to_string(),
            role: None,
        };
        let error = request.validate().expect_err("invalid email");
        assert_eq!(error.field, "email");
    }

    #[test]
    fn phone_length_is_bounded() {
        assert_eq!(
            clean_phone("phone_number", Some("  ".to_string()), MAX_PHONE_LEN),
            Ok(None)
        );
        assert!(clean_phone("phone_number", Some("0".repeat(16)), MAX_PHONE_LEN).is_err());
    }
}
