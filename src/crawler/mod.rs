//! Crawler module for link fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching (HEAD then GET)
//! - HTML parsing and link extraction
//! - The worker pool executing fetch tasks
//! - Link classification and overall crawl coordination

mod classify;
mod coordinator;
mod events;
mod fetcher;
mod parser;
mod pool;
mod task;
mod types;

pub use classify::{Disposition, LinkClassifier};
pub use coordinator::{ScanController, ScanOutcome, ScanSession, Scanner};
pub use events::{ResultEvent, SkipReason};
pub use fetcher::{build_user_agent, is_html_content_type, Fetcher, HeadResponse};
pub use parser::extract_links;
pub use pool::WorkerPool;
pub use task::CrawlTask;
pub use types::{CrawlOptions, FollowPolicy, Origin, ScanState};
