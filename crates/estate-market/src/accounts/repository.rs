use super::domain::{AgentProfile, User, UserProfile};
use crate::shared::UserId;
use crate::store::RepositoryError;

/// Storage abstraction for users and their profiles.
pub trait AccountRepository: Send + Sync {
    /// Fails with `Conflict` when the e-mail is taken.
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    fn user_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError>;
    fn upsert_user_profile(&self, profile: UserProfile) -> Result<(), RepositoryError>;

    /// Fails with `Conflict` when the license number is held by another agent.
    fn upsert_agent_profile(&self, profile: AgentProfile) -> Result<(), RepositoryError>;
    fn agent_profile(&self, id: UserId) -> Result<Option<AgentProfile>, RepositoryError>;
    fn agent_profiles(&self) -> Result<Vec<AgentProfile>, RepositoryError>;
}
