use std::sync::Arc;

use smartlock_types::domain::stock::{ReservedLine, StockReservation};
use smartlock_types::ports::{CatalogRepository, ReservationError};

/// Sale-driven stock movements. Admin edits set `stock` directly through the
/// catalog and never pass through here.
pub struct StockLedger<R: CatalogRepository> {
    repo: Arc<R>,
}

impl<R: CatalogRepository> StockLedger<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn reserve(
        &self,
        items: &[StockReservation],
    ) -> Result<Vec<ReservedLine>, ReservationError> {
        match self.repo.reserve(items).await {
            Ok(lines) => {
                tracing::debug!(lines = lines.len(), "stock reserved");
                Ok(lines)
            }
            Err(ReservationError::Insufficient(shortages)) => {
                tracing::info!(?shortages, "reservation refused");
                Err(ReservationError::Insufficient(shortages))
            }
            Err(e) => Err(e),
        }
    }

    /// Compensates a reservation whose order could not be stored. A failure
    /// here leaves the stock understated, so it is logged loudly but not
    /// returned: the caller is already reporting the original failure.
    pub async fn release(&self, items: &[StockReservation]) {
        match self.repo.release(items).await {
            Ok(()) => tracing::info!(lines = items.len(), "reservation released"),
            Err(e) => tracing::error!(error = %e, ?items, "failed to release reserved stock"),
        }
    }
}
