//! Crawl orchestration
//!
//! The [`Scanner`] owns everything a crawl reads: the options and rule
//! snapshot, the crawl's domain and the visited set. It seeds the worker
//! pool, then drains completed tasks one at a time on a single task,
//! emitting a [`ResultEvent`] per link and dispatching newly accepted links
//! back into the pool.
//!
//! State transitions are published on a `watch` channel. The same channel
//! is the pause gate for the workers and for the drain loop, so a pause
//! defers work without losing any of it.

use crate::config::UserAgentConfig;
use crate::crawler::classify::{Disposition, LinkClassifier};
use crate::crawler::pool::{wait_until_runnable, WorkerPool};
use crate::crawler::{
    CrawlOptions, CrawlTask, Fetcher, FollowPolicy, Origin, ResultEvent, ScanState,
};
use crate::rules::{CrawlRule, RuleSet};
use crate::url::{extract_domain, is_same_domain, normalize_seed};
use crate::{ConfigError, Result, UrlError};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

/// How a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every discovered link was processed
    Done,
    /// The scan was stopped before it ran out of work
    Stopped,
}

/// Cloneable handle for pausing, resuming and stopping a scan
#[derive(Debug, Clone)]
pub struct ScanController {
    state: Arc<watch::Sender<ScanState>>,
}

impl ScanController {
    /// Current state of the scan
    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Subscribes to state transitions
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Pauses a running scan; returns whether the state changed
    pub fn pause(&self) -> bool {
        self.transition(ScanState::Running, ScanState::Paused)
    }

    /// Resumes a paused scan; returns whether the state changed
    pub fn resume(&self) -> bool {
        self.transition(ScanState::Paused, ScanState::Running)
    }

    /// Pauses a running scan or resumes a paused one
    ///
    /// Returns the state after the call. Other states are left alone.
    pub fn toggle_pause(&self) -> ScanState {
        self.state.send_if_modified(|state| match *state {
            ScanState::Running => {
                *state = ScanState::Paused;
                true
            }
            ScanState::Paused => {
                *state = ScanState::Running;
                true
            }
            _ => false,
        });
        self.state()
    }

    /// Stops the scan
    ///
    /// In-flight requests finish but their results are discarded. Has no
    /// effect once the scan is done.
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                false
            } else {
                *state = ScanState::Stopped;
                true
            }
        })
    }

    fn transition(&self, from: ScanState, to: ScanState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }
}

/// A started scan
pub struct ScanSession {
    pub controller: ScanController,
    /// Result events in processing order; ends with `Done` unless stopped
    pub events: UnboundedReceiver<ResultEvent>,
    /// Resolves when the drain loop exits
    pub handle: JoinHandle<ScanOutcome>,
}

/// A configured, not yet started scan
pub struct Scanner {
    seed: Url,
    classifier: LinkClassifier,
    fetcher: Fetcher,
    state: Arc<watch::Sender<ScanState>>,
}

impl Scanner {
    /// Prepares a scan with the default user agent
    ///
    /// # Errors
    ///
    /// Fails on an unusable seed URL or a zero timeout. Nothing is fetched
    /// until the scan is started.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use link_scanner::{CrawlOptions, Scanner};
    ///
    /// # async fn example() -> link_scanner::Result<()> {
    /// let scanner = Scanner::new(CrawlOptions::new("https://example.com/"), vec![])?;
    /// let mut session = scanner.start();
    /// while let Some(event) = session.events.recv().await {
    ///     println!("{:?}", event);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(options: CrawlOptions, rules: Vec<CrawlRule>) -> Result<Self> {
        Self::with_user_agent(options, rules, &UserAgentConfig::default())
    }

    /// Prepares a scan identifying itself with `user_agent`
    pub fn with_user_agent(
        mut options: CrawlOptions,
        rules: Vec<CrawlRule>,
        user_agent: &UserAgentConfig,
    ) -> Result<Self> {
        if options.timeout.is_zero() {
            return Err(
                ConfigError::Validation("request timeout must be greater than zero".into()).into(),
            );
        }
        options.threads = options.threads.max(1);

        let seed = normalize_seed(&options.url)?;
        let domain = extract_domain(&seed).ok_or(UrlError::MissingDomain)?;
        let fetcher = Fetcher::new(user_agent)?;

        tracing::debug!("Scan of {} bounded to domain {}", seed, domain);

        let classifier = LinkClassifier::new(options, domain, RuleSet::new(rules), &seed);
        let (state, _) = watch::channel(ScanState::Idle);

        Ok(Self {
            seed,
            classifier,
            fetcher,
            state: Arc::new(state),
        })
    }

    /// Controller for this scan, usable before and after it starts
    pub fn controller(&self) -> ScanController {
        ScanController {
            state: Arc::clone(&self.state),
        }
    }

    /// The domain separating internal from external links
    pub fn domain(&self) -> &str {
        self.classifier.domain()
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn options(&self) -> &CrawlOptions {
        self.classifier.options()
    }

    /// Starts the scan on a background task
    ///
    /// The seed task is dispatched before this returns, so a controller call
    /// made right afterwards applies to a running scan.
    pub fn start(self) -> ScanSession {
        let controller = self.controller();
        let (events_tx, events) = mpsc::unbounded_channel();

        let active = self.launch(events_tx);
        let handle = tokio::spawn(async move {
            match active {
                Some(active) => active.drain().await,
                None => ScanOutcome::Stopped,
            }
        });

        ScanSession {
            controller,
            events,
            handle,
        }
    }

    /// Runs the scan to completion on the current task
    pub async fn run(self, events: UnboundedSender<ResultEvent>) -> ScanOutcome {
        match self.launch(events) {
            Some(active) => active.drain().await,
            None => ScanOutcome::Stopped,
        }
    }

    /// Creates the pool, seeds it and moves to `Running`
    ///
    /// Returns `None` if the scan was stopped before it started.
    fn launch(self, events: UnboundedSender<ResultEvent>) -> Option<ActiveScan> {
        let Self {
            seed,
            classifier,
            fetcher,
            state,
        } = self;

        let options = classifier.options();
        let mut pool = WorkerPool::new(options.threads, fetcher, state.subscribe());
        pool.add(CrawlTask::seed(
            seed.clone(),
            options.timeout,
            options.follow_redirects,
        ));

        let started = state.send_if_modified(|s| {
            if *s == ScanState::Idle {
                *s = ScanState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            tracing::info!("Scan of {} stopped before it started", seed);
            return None;
        }

        tracing::info!(
            "Starting scan of {} with {} workers",
            seed,
            pool.size()
        );
        pool.start();

        Some(ActiveScan {
            gate: state.subscribe(),
            state,
            classifier,
            pool,
            events,
            processed: 0,
        })
    }
}

/// A running scan's drain loop state
struct ActiveScan {
    state: Arc<watch::Sender<ScanState>>,
    gate: watch::Receiver<ScanState>,
    classifier: LinkClassifier,
    pool: WorkerPool,
    events: UnboundedSender<ResultEvent>,
    processed: usize,
}

impl ActiveScan {
    async fn drain(mut self) -> ScanOutcome {
        loop {
            let next = tokio::select! {
                biased;
                _ = wait_for_stop(&mut self.gate) => None,
                next = self.pool.next_completed() => Some(next),
            };
            let Some(next) = next else {
                return self.stopped();
            };
            let Some(mut task) = next else {
                break;
            };

            // Results are held, not dropped, while paused
            if !wait_until_runnable(&mut self.gate).await {
                return self.stopped();
            }

            self.processed += 1;
            if self.process(&mut task) && !self.pace().await {
                return self.stopped();
            }
        }

        self.finish().await
    }

    /// Reports one completed task and dispatches its accepted links
    ///
    /// Returns whether the task's links were expanded.
    fn process(&mut self, task: &mut CrawlTask) -> bool {
        if task.origin == Origin::Internal
            && task.redirected
            && !is_same_domain(task.effective_url(), self.classifier.domain())
        {
            tracing::debug!(
                "{} redirected off-domain to {}",
                task.link,
                task.effective_url()
            );
            task.origin = Origin::External;
        }

        if let Some(error) = task.error.take() {
            self.emit(ResultEvent::Error {
                link: task.link.clone(),
                source: task.source.clone(),
                origin: task.origin,
                error,
            });
            return false;
        }

        self.emit(ResultEvent::Completed {
            link: task.link.clone(),
            source: task.source.clone(),
            origin: task.origin,
            status: task.status,
            final_url: task.effective_url().clone(),
        });

        if task.origin == Origin::External
            && self.classifier.options().external != FollowPolicy::Follow
        {
            return false;
        }

        for link in std::mem::take(&mut task.links) {
            match self.classifier.classify(task, &link) {
                Disposition::Accept(child) => {
                    tracing::trace!("Dispatching {} (depth {})", child.link, child.depth);
                    self.pool.add(child);
                }
                Disposition::Skip {
                    link,
                    origin,
                    reason,
                } => {
                    tracing::debug!("Skipping {}: {}", link, reason);
                    self.emit(ResultEvent::Skipped {
                        link,
                        source: Some(task.link.clone()),
                        origin,
                        reason,
                    });
                }
                Disposition::Drop => {}
            }
        }

        true
    }

    /// Sleeps for the configured delay; returns `false` if stopped meanwhile
    async fn pace(&mut self) -> bool {
        let delay = self.classifier.options().delay;
        if delay.is_zero() {
            return true;
        }

        tokio::select! {
            biased;
            _ = wait_for_stop(&mut self.gate) => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    async fn finish(self) -> ScanOutcome {
        let Self {
            state,
            classifier,
            pool,
            events,
            processed,
            ..
        } = self;
        pool.shutdown().await;

        let done = state.send_if_modified(|s| {
            if s.is_terminal() {
                false
            } else {
                *s = ScanState::Done;
                true
            }
        });
        if !done {
            return ScanOutcome::Stopped;
        }

        tracing::info!(
            "Scan finished: {} links checked, {} links seen",
            processed,
            classifier.visited_count()
        );
        if events.send(ResultEvent::Done).is_err() {
            tracing::trace!("Event receiver dropped before Done");
        }
        ScanOutcome::Done
    }

    fn stopped(self) -> ScanOutcome {
        tracing::info!(
            "Scan stopped after {} links, {} still pending",
            self.processed,
            self.pool.pending()
        );
        // Dropping the pool closes its queues; workers exit after their
        // current request
        ScanOutcome::Stopped
    }

    fn emit(&self, event: ResultEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

/// Resolves once the scan is stopped, or its state channel is gone
async fn wait_for_stop(gate: &mut watch::Receiver<ScanState>) {
    let _ = gate.wait_for(|state| *state == ScanState::Stopped).await;
}
