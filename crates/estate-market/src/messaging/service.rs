use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    ContactRequest, Message, MessageDraft, MessageThread, Notification, NotificationDraft,
    NotificationKind, NotificationPreference, PreferencesUpdate,
};
use super::repository::MessagingRepository;
use crate::accounts::AccountRepository;
use crate::error::FieldError;
use crate::mail::Postman;
use crate::shared::{MessageId, NotificationId, Page, UserId};
use crate::store::RepositoryError;

pub const NOTIFICATIONS_PER_PAGE: usize = 20;

/// Fans a notification out to the in-app inbox, e-mail and the push log
/// according to the recipient's preferences.
pub struct Notifier {
    repository: Arc<dyn MessagingRepository>,
    accounts: Arc<dyn AccountRepository>,
    postman: Postman,
}

impl Notifier {
    pub fn new(
        repository: Arc<dyn MessagingRepository>,
        accounts: Arc<dyn AccountRepository>,
        postman: Postman,
    ) -> Self {
        Self {
            repository,
            accounts,
            postman,
        }
    }

    pub fn postman(&self) -> &Postman {
        &self.postman
    }

    /// Stored preferences, created with defaults on first use.
    pub fn preferences_for(&self, user: UserId) -> Result<NotificationPreference, RepositoryError> {
        if let Some(preferences) = self.repository.preferences(user)? {
            return Ok(preferences);
        }
        let preferences = NotificationPreference::defaults(user);
        self.repository.upsert_preferences(preferences)?;
        Ok(preferences)
    }

    /// Returns `None` when the recipient opted out of this kind.
    pub fn notify(
        &self,
        draft: NotificationDraft,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, RepositoryError> {
        let preferences = self.preferences_for(draft.user)?;
        if !preferences.allows(draft.kind) {
            debug!(user = %draft.user, kind = ?draft.kind, "notification suppressed by preference");
            return Ok(None);
        }

        let notification = self.repository.insert_notification(Notification {
            id: NotificationId::new(),
            user: draft.user,
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            property: draft.property,
            link: draft.link,
            metadata: draft.metadata,
            is_read: false,
            created_at: now,
        })?;

        if preferences.email_notifications {
            if let Some(user) = self.accounts.user(notification.user)? {
                let mut body = format!("Hi {},\n\n{}", user.name, notification.message);
                if let Some(link) = &notification.link {
                    body.push_str(&format!("\n\n{}", self.postman.config().link(link)));
                }
                self.postman.deliver(&user.email, &notification.title, body);
            }
        }

        if preferences.push_notifications {
            info!(
                user = %notification.user,
                kind = notification.kind.label(),
                title = %notification.title,
                "push notification queued"
            );
        }

        Ok(Some(notification))
    }

    /// Side-effect variant: failures are logged and swallowed.
    pub fn notify_quietly(&self, draft: NotificationDraft, now: DateTime<Utc>) {
        let user = draft.user;
        let kind = draft.kind;
        if let Err(err) = self.notify(draft, now) {
            warn!(%user, ?kind, error = %err, "notification dropped");
        }
    }
}

/// Service backing direct messages, notification inboxes and the contact form.
pub struct MessagingService {
    repository: Arc<dyn MessagingRepository>,
    accounts: Arc<dyn AccountRepository>,
    notifier: Arc<Notifier>,
}

impl MessagingService {
    pub fn new(
        repository: Arc<dyn MessagingRepository>,
        accounts: Arc<dyn AccountRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            repository,
            accounts,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn send_message(
        &self,
        sender: UserId,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<Message, MessagingError> {
        if draft.receiver == sender {
            return Err(FieldError::new("receiver", "You cannot message yourself.").into());
        }
        let body = draft.body.trim();
        if body.is_empty() {
            return Err(FieldError::new("body", "Message body is required.").into());
        }
        let receiver = self
            .accounts
            .user(draft.receiver)?
            .ok_or_else(|| FieldError::new("receiver", "Recipient does not exist."))?;
        let sender_name = self.display_name(sender)?;

        let message = self.repository.insert_message(Message {
            id: MessageId::new(),
            sender,
            receiver: receiver.id,
            subject: draft.subject.trim().to_string(),
            body: body.to_string(),
            property: draft.property,
            parent: None,
            is_read: false,
            created_at: now,
        })?;

        self.notify_receiver(&message, &sender_name, now);
        Ok(message)
    }

    /// Messages sent or received, newest first. Unread received messages are
    /// marked read as they are listed.
    pub fn inbox(&self, user: UserId) -> Result<Vec<Message>, MessagingError> {
        let mut messages = self.repository.messages_involving(user)?;
        for message in messages.iter_mut() {
            if message.receiver == user && !message.is_read {
                message.is_read = true;
                self.repository.update_message(message.clone())?;
            }
        }
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    pub fn message_detail(
        &self,
        user: UserId,
        id: MessageId,
    ) -> Result<MessageThread, MessagingError> {
        let mut message = self.participant_message(user, id)?;
        if message.receiver == user && !message.is_read {
            message.is_read = true;
            self.repository.update_message(message.clone())?;
        }
        let mut replies = self.repository.replies_to(id)?;
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(MessageThread { message, replies })
    }

    pub fn reply(
        &self,
        user: UserId,
        id: MessageId,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Message, MessagingError> {
        let original = self.participant_message(user, id)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(FieldError::new("body", "Reply cannot be empty.").into());
        }
        let sender_name = self.display_name(user)?;
        let subject = if original.subject.to_lowercase().starts_with("re:") {
            original.subject.clone()
        } else {
            format!("Re: {}", original.subject)
        };

        let reply = self.repository.insert_message(Message {
            id: MessageId::new(),
            sender: user,
            receiver: original.counterpart(user),
            subject,
            body: body.to_string(),
            property: original.property,
            parent: Some(original.id),
            is_read: false,
            created_at: now,
        })?;

        self.notify_receiver(&reply, &sender_name, now);
        Ok(reply)
    }

    pub fn delete_message(&self, user: UserId, id: MessageId) -> Result<(), MessagingError> {
        self.participant_message(user, id)?;
        self.repository.delete_message(id)?;
        Ok(())
    }

    pub fn notifications(
        &self,
        user: UserId,
        page: Option<&str>,
    ) -> Result<Page<Notification>, MessagingError> {
        let mut notifications = self.repository.notifications_for(user)?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::paginate(notifications, page, NOTIFICATIONS_PER_PAGE))
    }

    /// Marks the notification read and returns it so the caller can follow
    /// its link.
    pub fn notification_detail(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Notification, MessagingError> {
        self.mark_read(user, id)
    }

    pub fn mark_read(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Notification, MessagingError> {
        let mut notification = self.owned_notification(user, id)?;
        if !notification.is_read {
            notification.is_read = true;
            self.repository.update_notification(notification.clone())?;
        }
        Ok(notification)
    }

    pub fn mark_all_read(&self, user: UserId) -> Result<usize, MessagingError> {
        let mut updated = 0;
        for mut notification in self.repository.notifications_for(user)? {
            if !notification.is_read {
                notification.is_read = true;
                self.repository.update_notification(notification)?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    pub fn delete_notification(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<(), MessagingError> {
        self.owned_notification(user, id)?;
        self.repository.delete_notification(id)?;
        Ok(())
    }

    pub fn unread_count(&self, user: UserId) -> Result<usize, MessagingError> {
        Ok(self
            .repository
            .notifications_for(user)?
            .iter()
            .filter(|notification| !notification.is_read)
            .count())
    }

    pub fn preferences(&self, user: UserId) -> Result<NotificationPreference, MessagingError> {
        Ok(self.notifier.preferences_for(user)?)
    }

    pub fn update_preferences(
        &self,
        user: UserId,
        update: &PreferencesUpdate,
    ) -> Result<NotificationPreference, MessagingError> {
        let mut preferences = self.notifier.preferences_for(user)?;
        update.apply(&mut preferences);
        self.repository.upsert_preferences(preferences)?;
        Ok(preferences)
    }

    /// Relay the public contact form to the site inbox. Returns whether the
    /// e-mail was accepted by the transport.
    pub fn contact(&self, request: &ContactRequest) -> Result<bool, MessagingError> {
        request.validate()?;
        let postman = self.notifier.postman();
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .unwrap_or("not provided");
        let body = format!(
            "Name: {}\nEmail: {}\nPhone: {}\nInterest: {}\n\n{}",
            request.name.trim(),
            request.email.trim(),
            phone,
            request.interest.label(),
            request.message.trim()
        );
        let subject = format!("Contact form: {}", request.interest.label());
        let contact_address = postman.config().contact_address.clone();
        Ok(postman.deliver_with_reply_to(&contact_address, request.email.trim(), &subject, body))
    }

    fn participant_message(&self, user: UserId, id: MessageId) -> Result<Message, MessagingError> {
        let message = self
            .repository
            .message(id)?
            .ok_or(MessagingError::NotFound)?;
        if !message.involves(user) {
            return Err(MessagingError::Forbidden);
        }
        Ok(message)
    }

    fn owned_notification(
        &self,
        user: UserId,
        id: NotificationId,
    ) -> Result<Notification, MessagingError> {
        let notification = self
            .repository
            .notification(id)?
            .ok_or(MessagingError::NotFound)?;
        if notification.user != user {
            return Err(MessagingError::NotFound);
        }
        Ok(notification)
    }

    fn display_name(&self, user: UserId) -> Result<String, MessagingError> {
        Ok(self
            .accounts
            .user(user)?
            .map(|user| user.name)
            .unwrap_or_else(|| "Someone".to_string()))
    }

    fn notify_receiver(&self, message: &Message, sender_name: &str, now: DateTime<Utc>) {
        let thread = message.parent.unwrap_or(message.id);
        let mut draft = NotificationDraft::new(
            message.receiver,
            NotificationKind::Message,
            format!("New message from {sender_name}"),
            message.body.chars().take(120).collect::<String>(),
        )
        .link(format!("/messages/{thread}"))
        .meta("message_id", message.id);
        if let Some(property) = message.property {
            draft = draft.property(property);
        }
        self.notifier.notify_quietly(draft, now);
    }
}

/// Error raised by the messaging service.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("message or notification not found")]
    NotFound,
    #[error("only participants may access this conversation")]
    Forbidden,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
