use crate::types::{DuplicatePolicy, NewsItem, Result, SaveReport, StoreOutcome};
use async_trait::async_trait;
use tracing::{info, warn};

/// Persistent table of headlines keyed by title.
#[async_trait]
pub trait HeadlineStore: Send + Sync {
    /// Short backend name used in logs
    fn backend(&self) -> &'static str;

    /// Create the `news` table if it does not exist yet.
    async fn init_schema(&self) -> Result<()>;

    /// Store one item, resolving an existing title according to `policy`.
    ///
    /// Under [`DuplicatePolicy::Reject`] an existing title yields
    /// `AggregatorError::DuplicateTitle`.
    async fn store_item(&self, item: &NewsItem, policy: DuplicatePolicy) -> Result<StoreOutcome>;

    async fn get(&self, title: &str) -> Result<Option<NewsItem>>;

    async fn count(&self) -> Result<i64>;

    /// Strict insert: fails when the title is already stored.
    async fn insert(&self, item: &NewsItem) -> Result<()> {
        self.store_item(item, DuplicatePolicy::Reject).await.map(|_| ())
    }

    /// Store every item. A failing item is logged and counted, and the
    /// remaining items are still attempted.
    async fn save(&self, items: &[NewsItem], policy: DuplicatePolicy) -> Result<SaveReport> {
        let mut report = SaveReport::default();

        for item in items {
            match self.store_item(item, policy).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(title = %item.title, error = %e, "Failed to store headline");
                    report.failed += 1;
                }
            }
        }

        info!(
            backend = self.backend(),
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "News has been saved to the database"
        );
        Ok(report)
    }
}
