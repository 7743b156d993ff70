pub(super) use crate::test_support::*;

use crate::accounts::Actor;
use crate::messaging::{
    ContactInterest, ContactRequest, MessageDraft, NotificationDraft, NotificationKind,
};

pub(super) fn note_to(receiver: &Actor, body: &str) -> MessageDraft {
    MessageDraft {
        receiver: receiver.user_id,
        subject: "Viewing times".to_string(),
        body: body.to_string(),
        property: None,
    }
}

pub(super) fn system_notice(user: &Actor, n: usize) -> NotificationDraft {
    NotificationDraft::new(
        user.user_id,
        NotificationKind::System,
        format!("Notice {n}"),
        "Scheduled maintenance tonight",
    )
}

pub(super) fn contact_form() -> ContactRequest {
    ContactRequest {
        name: "Tolu Ade".to_string(),
        email: "tolu@example.com".to_string(),
        phone: None,
        interest: ContactInterest::Rent,
        message: "I need a two bedroom flat in Yaba".to_string(),
    }
}
