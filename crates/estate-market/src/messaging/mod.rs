//! Direct messages between users, the in-app notification inbox and the
//! public contact form.
//!
//! Every other area raises notifications through the shared [`Notifier`],
//! which honours each recipient's [`NotificationPreference`].

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ContactInterest, ContactRequest, Message, MessageDraft, MessageThread, Notification,
    NotificationDraft, NotificationKind, NotificationPreference, PreferencesUpdate, ReplyRequest,
};
pub use repository::MessagingRepository;
pub use router::messaging_router;
pub use service::{MessagingError, MessagingService, Notifier, NOTIFICATIONS_PER_PAGE};
