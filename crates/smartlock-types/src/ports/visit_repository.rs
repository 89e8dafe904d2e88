use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepoError;
use crate::domain::visit::{NewVisit, SiteStats};

#[async_trait]
pub trait VisitRepository: Send + Sync + 'static {
    async fn log_visit(&self, visit: NewVisit) -> Result<(), RepoError>;
    async fn site_stats(&self, now: DateTime<Utc>) -> Result<SiteStats, RepoError>;
}
