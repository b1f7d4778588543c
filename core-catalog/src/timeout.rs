//! Per-call time budgets for store round trips

use crate::error::{CatalogError, Result};
use std::future::Future;
use std::time::Duration;
use store_traits::StoreError;
use tracing::warn;

/// Await `call` for at most `budget`. Expiry becomes `StoreError::Timeout`;
/// nothing is retried.
pub(crate) async fn bounded<T, F>(operation: &'static str, budget: Duration, call: F) -> Result<T>
where
    F: Future<Output = store_traits::Result<T>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result.map_err(CatalogError::from),
        Err(_) => {
            warn!(
                operation,
                budget_ms = budget.as_millis() as u64,
                "Store call exceeded its time budget"
            );
            Err(StoreError::Timeout { operation, budget }.into())
        }
    }
}
