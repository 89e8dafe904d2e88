use async_trait::async_trait;

use super::RepoError;
use crate::domain::contact::{ContactMessage, MessageStatus, NewMessage};

#[async_trait]
pub trait MessageRepository: Send + Sync + 'static {
    async fn create_message(&self, message: NewMessage) -> Result<ContactMessage, RepoError>;
    async fn get_message(&self, id: i64) -> Result<Option<ContactMessage>, RepoError>;
    /// Newest first.
    async fn list_messages(&self) -> Result<Vec<ContactMessage>, RepoError>;
    async fn update_message_status(
        &self,
        id: i64,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, RepoError>;
}
