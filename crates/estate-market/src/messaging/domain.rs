use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::shared::{looks_like_email, MessageId, NotificationId, PropertyId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub receiver: UserId,
    pub subject: String,
    pub body: String,
    pub property: Option<PropertyId>,
    pub parent: Option<MessageId>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn involves(&self, user: UserId) -> bool {
        self.sender == user || self.receiver == user
    }

    /// The participant that is not `user`.
    pub fn counterpart(&self, user: UserId) -> UserId {
        if self.sender == user {
            self.receiver
        } else {
            self.sender
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewListing,
    PriceChange,
    Favorite,
    NewLead,
    Viewing,
    ViewingUpdate,
    Message,
    System,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::NewListing => "New Listing",
            NotificationKind::PriceChange => "Price Change",
            NotificationKind::Favorite => "Favorite",
            NotificationKind::NewLead => "New Lead",
            NotificationKind::Viewing => "Viewing",
            NotificationKind::ViewingUpdate => "Viewing Update",
            NotificationKind::Message => "Message",
            NotificationKind::System => "System",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub property: Option<PropertyId>,
    pub link: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything a caller supplies to raise a notification.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub user: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub property: Option<PropertyId>,
    pub link: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl NotificationDraft {
    pub fn new(
        user: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user,
            kind,
            title: title.into(),
            message: message.into(),
            property: None,
            link: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn property(mut self, property: PropertyId) -> Self {
        self.property = Some(property);
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn meta(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user: UserId,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub new_message: bool,
    pub price_change: bool,
    pub new_listing: bool,
    pub viewing_update: bool,
}

impl NotificationPreference {
    pub fn defaults(user: UserId) -> Self {
        Self {
            user,
            email_notifications: true,
            push_notifications: false,
            new_message: true,
            price_change: true,
            new_listing: true,
            viewing_update: true,
        }
    }

    /// Kinds without a dedicated toggle are always delivered.
    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Message => self.new_message,
            NotificationKind::PriceChange => self.price_change,
            NotificationKind::NewListing => self.new_listing,
            NotificationKind::ViewingUpdate => self.viewing_update,
            NotificationKind::Favorite
            | NotificationKind::NewLead
            | NotificationKind::Viewing
            | NotificationKind::System => true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub new_message: Option<bool>,
    pub price_change: Option<bool>,
    pub new_listing: Option<bool>,
    pub viewing_update: Option<bool>,
}

impl PreferencesUpdate {
    pub fn apply(&self, preferences: &mut NotificationPreference) {
        let toggles = [
            (self.email_notifications, &mut preferences.email_notifications),
            (self.push_notifications, &mut preferences.push_notifications),
            (self.new_message, &mut preferences.new_message),
            (self.price_change, &mut preferences.price_change),
            (self.new_listing, &mut preferences.new_listing),
            (self.viewing_update, &mut preferences.viewing_update),
        ];
        for (requested, slot) in toggles {
            if let Some(value) = requested {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDraft {
    pub receiver: UserId,
    #[serde(default)]
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub property: Option<PropertyId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageThread {
    pub message: Message,
    pub replies: Vec<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactInterest {
    Location,
    Rent,
    Sale,
    Utilities,
}

impl ContactInterest {
    pub fn label(self) -> &'static str {
        match self {
            ContactInterest::Location => "Location",
            ContactInterest::Rent => "Rent",
            ContactInterest::Sale => "Sale",
            ContactInterest::Utilities => "Utilities",
        }
    }
}

/// Public contact form.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub interest: ContactInterest,
    pub message: String,
}

pub(crate) const CONTACT_NAME_MAX: usize = 100;
pub(crate) const CONTACT_PHONE_MAX: usize = 20;
pub(crate) const CONTACT_MESSAGE_MIN: usize = 10;

impl ContactRequest {
    pub(crate) fn validate(&self) -> Result<(), FieldError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FieldError::new("name", "Name is required."));
        }
        if name.chars().count() > CONTACT_NAME_MAX {
            return Err(FieldError::new(
                "name",
                format!("Ensure this value has at most {CONTACT_NAME_MAX} characters."),
            ));
        }
        if !looks_like_email(&self.email) {
            return Err(FieldError::new("email", "Enter a valid email address."));
        }
        if let Some(phone) = &self.phone {
            if phone.trim().chars().count() > CONTACT_PHONE_MAX {
                return Err(FieldError::new(
                    "phone",
                    format!("Ensure this value has at most {CONTACT_PHONE_MAX} characters."),
                ));
            }
        }
        if self.message.trim().chars().count() < CONTACT_MESSAGE_MIN {
            return Err(FieldError::new(
                "message",
                "Message must be at least 10 characters long.",
            ));
        }
        Ok(())
    }
}
