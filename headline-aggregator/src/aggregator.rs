use crate::types::{NewsItem, Source, SourceOutcome};
use crate::{Fetcher, HeadlineParser};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Fans fetch+parse out over every configured source and gathers the results.
pub struct HeadlineAggregator {
    sources: Arc<[Source]>,
    fetcher: Fetcher,
    parser: HeadlineParser,
}

impl HeadlineAggregator {
    pub fn new(sources: impl Into<Arc<[Source]>>, fetcher: Fetcher) -> Self {
        Self {
            sources: sources.into(),
            fetcher,
            parser: HeadlineParser::new(),
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Run every source concurrently. Results come back in configuration
    /// order, and a failing source only empties its own outcome.
    pub async fn collect_sources(&self) -> Vec<SourceOutcome> {
        let outcomes = join_all(self.sources.iter().map(|source| self.fetch_source(source))).await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(sources = outcomes.len(), failed, "Collected headlines from all sources");
        outcomes
    }

    /// All items from all sources, grouped by source in configuration order.
    pub async fn aggregate(&self) -> Vec<NewsItem> {
        self.collect_sources()
            .await
            .into_iter()
            .flat_map(|outcome| outcome.items)
            .collect()
    }

    async fn fetch_source(&self, source: &Source) -> SourceOutcome {
        let html = match self.fetcher.fetch(&source.url).await {
            Ok(html) => html,
            Err(e) => {
                error!(source = %source.name, url = %source.url, error = %e, "Error fetching page");
                return SourceOutcome {
                    source: source.name.clone(),
                    items: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        match self.parser.parse(&html, &source.selector, source.resolve_base()) {
            Ok(items) => {
                info!(source = %source.name, count = items.len(), "Extracted headlines");
                SourceOutcome {
                    source: source.name.clone(),
                    items,
                    error: None,
                }
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "Failed to parse headlines");
                SourceOutcome {
                    source: source.name.clone(),
                    items: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
