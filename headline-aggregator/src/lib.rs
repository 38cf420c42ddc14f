pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod aggregator;
pub mod traits;
pub mod store;
pub mod scheduler;

pub use types::*;
pub use config::AppConfig;
pub use fetcher::Fetcher;
pub use parser::HeadlineParser;
pub use aggregator::HeadlineAggregator;
pub use traits::HeadlineStore;
pub use store::{PgHeadlineStore, SqliteHeadlineStore};
pub use scheduler::Scheduler;
