//! Scan statistics
//!
//! Counts every event of a scan, independent of any display filter.

use crate::crawler::{Origin, ResultEvent};
use crate::output::filter::StatusClass;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Scan statistics summary
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Total number of link events
    pub total_links: u64,

    /// Count of links by status class
    pub by_class: BTreeMap<StatusClass, u64>,

    pub internal_links: u64,
    pub external_links: u64,

    /// Whether the scan ran out of work rather than being stopped
    pub completed: bool,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total_links: 0,
            by_class: BTreeMap::new(),
            internal_links: 0,
            external_links: 0,
            completed: false,
        }
    }

    pub fn record(&mut self, event: &ResultEvent) {
        if event.is_done() {
            self.completed = true;
            return;
        }

        self.total_links += 1;
        if let Some(class) = StatusClass::from_event(event) {
            *self.by_class.entry(class).or_insert(0) += 1;
        }
        match event.origin() {
            Some(Origin::Internal) => self.internal_links += 1,
            Some(Origin::External) => self.external_links += 1,
            None => {}
        }
    }

    /// Marks the end of the scan
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn count(&self, class: StatusClass) -> u64 {
        self.by_class.get(&class).copied().unwrap_or(0)
    }

    /// Links reported as broken: client errors, server errors and network failures
    pub fn broken_links(&self) -> u64 {
        self.count(StatusClass::ClientError)
            + self.count(StatusClass::ServerError)
            + self.count(StatusClass::Timeout)
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CrawlStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Scan Statistics ===")?;
        writeln!(
            f,
            "  Links: {} ({} internal, {} external)",
            self.total_links, self.internal_links, self.external_links
        )?;

        for (class, count) in &self.by_class {
            let percentage = if self.total_links > 0 {
                (*count as f64 / self.total_links as f64) * 100.0
            } else {
                0.0
            };
            writeln!(f, "  {:<8} {} ({:.1}%)", class, count, percentage)?;
        }

        writeln!(f, "  Broken: {}", self.broken_links())?;
        if let Some(duration) = self.duration() {
            let millis = duration.num_milliseconds();
            writeln!(f, "  Duration: {}.{:03}s", millis / 1000, millis % 1000)?;
        }
        if !self.completed {
            writeln!(f, "  Scan was stopped before completion")?;
        }
        Ok(())
    }
}
