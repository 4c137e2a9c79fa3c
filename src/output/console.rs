use crate::crawler::ResultEvent;
use crate::output::filter::{status_label, ResultFilter};
use crate::output::stats::CrawlStatistics;
use crate::output::traits::EventSink;
use std::io::{self, Write};

/// Human readable output, one line per displayed event
pub struct ConsoleSink<W: Write> {
    out: W,
    filter: ResultFilter,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, filter: ResultFilter) -> Self {
        Self { out, filter }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn handle(&mut self, event: &ResultEvent) -> io::Result<()> {
        if event.is_done() || !self.filter.matches(event) {
            return Ok(());
        }
        let Some(link) = event.link() else {
            return Ok(());
        };

        let mut status = status_label(event);
        match event {
            ResultEvent::Skipped { reason, .. } => status = format!("{} ({})", status, reason),
            ResultEvent::Error { error, .. } if status != "Timeout" => {
                status = format!("{} ({})", status, error)
            }
            _ => {}
        }

        let origin = event.origin().map(|o| o.to_string()).unwrap_or_default();
        write!(self.out, "{:<24} {:<8} {}", status, origin, link)?;
        if let Some(source) = event.source() {
            write!(self.out, "  <- {}", source)?;
        }
        if let ResultEvent::Completed {
            link, final_url, ..
        } = event
        {
            if final_url != link {
                write!(self.out, "  -> {}", final_url)?;
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn finish(&mut self, stats: &CrawlStatistics) -> io::Result<()> {
        writeln!(self.out)?;
        write!(self.out, "{}", stats)?;
        self.out.flush()
    }
}

/// JSON lines output: one object per displayed event, then a summary object
pub struct JsonSink<W: Write> {
    out: W,
    filter: ResultFilter,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W, filter: ResultFilter) -> Self {
        Self { out, filter }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn handle(&mut self, event: &ResultEvent) -> io::Result<()> {
        if event.is_done() || !self.filter.matches(event) {
            return Ok(());
        }
        serde_json::to_writer(&mut self.out, event)?;
        writeln!(self.out)
    }

    fn finish(&mut self, stats: &CrawlStatistics) -> io::Result<()> {
        let summary = serde_json::json!({ "event": "summary", "statistics": stats });
        serde_json::to_writer(&mut self.out, &summary)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
