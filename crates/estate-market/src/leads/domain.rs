use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{LeadId, PropertyId, UserId, ViewingId};

/// Progress of a customer's interest in a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    ViewingScheduled,
    FollowUp,
    Closed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::ViewingScheduled,
        LeadStatus::FollowUp,
        LeadStatus::Closed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::ViewingScheduled => "Viewing Scheduled",
            LeadStatus::FollowUp => "Follow Up",
            LeadStatus::Closed => "Closed",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::ViewingScheduled => "viewing_scheduled",
            LeadStatus::FollowUp => "follow_up",
            LeadStatus::Closed => "closed",
        }
    }

    /// Whether an agent may move a lead from `self` to `next`. Staying put is
    /// always allowed so notes can be edited.
    pub fn can_transition_to(self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (New, Contacted | ViewingScheduled | Closed)
                | (Contacted, ViewingScheduled | FollowUp | Closed)
                | (ViewingScheduled, Contacted | FollowUp | Closed)
                | (FollowUp, Contacted | ViewingScheduled | Closed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub agent_id: UserId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub scheduled_viewing: Option<DateTime<Utc>>,
    pub message: String,
    pub notes: String,
    pub last_contact: Option<DateTime<Utc>>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ViewingStatus {
    pub fn label(self) -> &'static str {
        match self {
            ViewingStatus::Pending => "Pending",
            ViewingStatus::Confirmed => "Confirmed",
            ViewingStatus::Completed => "Completed",
            ViewingStatus::Cancelled => "Cancelled",
        }
    }

    /// Pending and confirmed viewings hold their time slot.
    pub fn holds_slot(self) -> bool {
        matches!(self, ViewingStatus::Pending | ViewingStatus::Confirmed)
    }

    pub fn can_transition_to(self, next: ViewingStatus) -> bool {
        use ViewingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | Cancelled) | (Confirmed, Completed | Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyViewing {
    pub id: ViewingId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub lead_id: Option<LeadId>,
    pub scheduled_time: DateTime<Utc>,
    pub status: ViewingStatus,
    pub notes: String,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadRequest {
    pub property_id: PropertyId,
    pub message: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteLeadRequest {
    pub message: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadUpdate {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadStatusUpdate {
    pub status: LeadStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewingRequest {
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewingStatusUpdate {
    pub status: ViewingStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Outcome of a lead submission. `created` is false when the customer already
/// had a lead on the property.
#[derive(Debug, Clone, Serialize)]
pub struct LeadReceipt {
    pub lead: Lead,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadDetail {
    pub lead: Lead,
    pub property_title: String,
    pub viewings: Vec<PropertyViewing>,
    pub upcoming_viewing: Option<PropertyViewing>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_leads_are_terminal() {
        for next in LeadStatus::ALL {
            assert_eq!(
                LeadStatus::Closed.can_transition_to(next),
                next == LeadStatus::Closed
            );
        }
    }

    #[test]
    fn new_leads_cannot_jump_to_follow_up() {
        assert!(!LeadStatus::New.can_transition_to(LeadStatus::FollowUp));
        assert!(LeadStatus::New.can_transition_to(LeadStatus::Contacted));
        assert!(LeadStatus::FollowUp.can_transition_to(LeadStatus::ViewingScheduled));
        assert!(!LeadStatus::Contacted.can_transition_to(LeadStatus::New));
    }

    #[test]
    fn viewing_transitions_move_forward_only() {
        assert!(ViewingStatus::Pending.can_transition_to(ViewingStatus::Confirmed));
        assert!(!ViewingStatus::Pending.can_transition_to(ViewingStatus::Completed));
        assert!(ViewingStatus::Confirmed.can_transition_to(ViewingStatus::Completed));
        assert!(!ViewingStatus::Completed.can_transition_to(ViewingStatus::Cancelled));
        assert!(!ViewingStatus::Cancelled.can_transition_to(ViewingStatus::Pending));
    }
}
