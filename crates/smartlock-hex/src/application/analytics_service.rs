use std::sync::Arc;

use chrono::Utc;

use crate::errors::AppError;
use smartlock_types::api::TrackVisitRequest;
use smartlock_types::domain::validation::ValidationErrors;
use smartlock_types::domain::visit::{NewVisit, SiteStats, UNKNOWN};
use smartlock_types::ports::VisitRepository;

const MAX_FIELD_LEN: usize = 512;

pub struct AnalyticsService<R: VisitRepository> {
    repo: Arc<R>,
}

fn clip(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().chars().take(MAX_FIELD_LEN).collect::<String>())
        .filter(|v| !v.is_empty())
}

impl<R: VisitRepository> AnalyticsService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Records a page view. Values from the body win over the connection
    /// details passed in `peer_ip` and `peer_agent`.
    pub async fn track(
        &self,
        request: TrackVisitRequest,
        peer_ip: Option<String>,
        peer_agent: Option<String>,
    ) -> Result<(), AppError> {
        let page_path = clip(Some(request.page_path))
            .ok_or_else(|| ValidationErrors::single("pagePath", "is required"))?;
        let visit = NewVisit {
            visitor_ip: clip(request.visitor_ip)
                .or_else(|| clip(peer_ip))
                .unwrap_or_else(|| UNKNOWN.into()),
            user_agent: clip(request.user_agent)
                .or_else(|| clip(peer_agent))
                .unwrap_or_else(|| UNKNOWN.into()),
            page_path,
        };
        tracing::debug!(page = %visit.page_path, "visit tracked");
        Ok(self.repo.log_visit(visit).await?)
    }

    pub async fn stats(&self) -> Result<SiteStats, AppError> {
        Ok(self.repo.site_stats(Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartlock_repo::memory::InMemoryRepo;

    #[tokio::test]
    async fn tracks_and_counts() {
        let svc = AnalyticsService::new(Arc::new(InMemoryRepo::new()));
        for ip in ["1.1.1.1", "1.1.1.1", "2.2.2.2"] {
            svc.track(
                TrackVisitRequest {
                    visitor_ip: None,
                    user_agent: None,
                    page_path: "/producten".into(),
                },
                Some(ip.into()),
                None,
            )
            .await
            .unwrap();
        }
        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total_visits, 3);
        assert_eq!(stats.unique_visitors, 2);
        assert_eq!(stats.today_visits, 3);
    }

    #[tokio::test]
    async fn page_path_is_required() {
        let svc = AnalyticsService::new(Arc::new(InMemoryRepo::new()));
        let res = svc.track(TrackVisitRequest::default(), None, None).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
    }
}
