pub(super) use crate::test_support::*;

use crate::accounts::{AgentContactRequest, AgentProfileUpdate, AgentType};

pub(super) fn contact_request() -> AgentContactRequest {
    AgentContactRequest {
        name: "Ngozi Eze".to_string(),
        email: "ngozi@example.com".to_string(),
        phone: Some("08030000000".to_string()),
        message: "Is the duplex in Ikoyi still available?".to_string(),
    }
}

pub(super) fn office_update() -> AgentProfileUpdate {
    AgentProfileUpdate {
        agent_type: Some(AgentType::RealEstateAgent),
        company_name: Some("  Harbor Homes ".to_string()),
        office_location: Some("Victoria Island".to_string()),
        office_phone: Some("0123456789".to_string()),
        description: Some("   ".to_string()),
        ..AgentProfileUpdate::default()
    }
}
