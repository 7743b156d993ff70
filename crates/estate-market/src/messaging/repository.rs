use super::domain::{Message, Notification, NotificationPreference};
use crate::shared::{MessageId, NotificationId, UserId};
use crate::store::RepositoryError;

/// Storage abstraction for messages, notifications and preferences.
pub trait MessagingRepository: Send + Sync {
    fn insert_message(&self, message: Message) -> Result<Message, RepositoryError>;
    fn update_message(&self, message: Message) -> Result<(), RepositoryError>;
    fn message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;
    /// Deletes the message and every reply beneath it.
    fn delete_message(&self, id: MessageId) -> Result<(), RepositoryError>;
    fn messages_involving(&self, user: UserId) -> Result<Vec<Message>, RepositoryError>;
    fn replies_to(&self, parent: MessageId) -> Result<Vec<Message>, RepositoryError>;

    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError>;
    fn update_notification(&self, notification: Notification) -> Result<(), RepositoryError>;
    fn notification(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError>;
    fn delete_notification(&self, id: NotificationId) -> Result<(), RepositoryError>;
    fn notifications_for(&self, user: UserId) -> Result<Vec<Notification>, RepositoryError>;

    fn preferences(&self, user: UserId) -> Result<Option<NotificationPreference>, RepositoryError>;
    fn upsert_preferences(&self, preferences: NotificationPreference)
        -> Result<(), RepositoryError>;
}
