//! Output sink trait
//!
//! A sink receives every event of a scan in processing order, then the
//! final statistics once the event stream has ended.

use crate::crawler::ResultEvent;
use crate::output::stats::CrawlStatistics;
use std::io;

/// Consumer of scan results
pub trait EventSink {
    /// Handles one event
    ///
    /// Sinks apply their own display filter; they see every event.
    fn handle(&mut self, event: &ResultEvent) -> io::Result<()>;

    /// Writes the end-of-scan summary
    fn finish(&mut self, stats: &CrawlStatistics) -> io::Result<()> {
        let _ = stats;
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn handle(&mut self, event: &ResultEvent) -> io::Result<()> {
        (**self).handle(event)
    }

    fn finish(&mut self, stats: &CrawlStatistics) -> io::Result<()> {
        (**self).finish(stats)
    }
}
