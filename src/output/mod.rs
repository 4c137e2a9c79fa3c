//! Output module for presenting scan results
//!
//! This module handles:
//! - Filtering which results are displayed
//! - Writing results as text or JSON lines
//! - Recording scan statistics

mod console;
pub mod filter;
pub mod stats;
mod traits;

pub use console::{ConsoleSink, JsonSink};
pub use filter::{status_label, ResultFilter, StatusClass};
pub use stats::CrawlStatistics;
pub use traits::EventSink;
