use std::sync::Arc;

use crate::errors::AppError;
use smartlock_types::domain::contact::{ContactMessage, MessageDraft, MessageStatus};
use smartlock_types::domain::order::UnknownStatus;
use smartlock_types::domain::validation::ValidationErrors;
use smartlock_types::ports::MessageRepository;

/// Contact form submissions and their triage.
pub struct MessageService<R: MessageRepository> {
    repo: Arc<R>,
}

impl<R: MessageRepository> MessageService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, draft: MessageDraft) -> Result<ContactMessage, AppError> {
        let message = self.repo.create_message(draft.validate()?).await?;
        tracing::info!(message_id = message.id, "contact message received");
        Ok(message)
    }

    pub async fn list_messages(&self) -> Result<Vec<ContactMessage>, AppError> {
        Ok(self.repo.list_messages().await?)
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<ContactMessage, AppError> {
        let next: MessageStatus = status
            .parse()
            .map_err(|e: UnknownStatus| ValidationErrors::single("status", e.to_string()))?;
        self.repo
            .update_message_status(id, next)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("message {id}")))
    }
}
