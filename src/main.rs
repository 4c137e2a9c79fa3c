//! Link Scanner main entry point
//!
//! This is the command-line interface for the Link Scanner link checker.

use anyhow::{Context, Result};
use clap::Parser;
use link_scanner::config::{load_config_with_hash, validate, Config, RuleEntry};
use link_scanner::output::{ConsoleSink, CrawlStatistics, EventSink, JsonSink, ResultFilter};
use link_scanner::{
    CrawlOptions, CrawlRule, FollowPolicy, RuleCondition, RuleScope, ScanController, ScanOutcome,
    ScanState, Scanner,
};
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Link Scanner: a concurrent web site link checker
///
/// Crawls a site from a seed URL, checks every link it finds and reports
/// each link's status as it is discovered. While running, type `p` to
/// pause or resume and `s` to stop.
#[derive(Parser, Debug)]
#[command(name = "link-scanner")]
#[command(version)]
#[command(about = "A concurrent web site link checker", long_about = None)]
struct Cli {
    /// Seed URL (overrides the config file)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of external-domain hops
    ///
    /// Counts the hop about to be taken: with 1, external links found on an
    /// external page are skipped even when external links are followed, and
    /// 0 checks no external link at all.
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Number of concurrent workers
    #[arg(short, long, value_name = "N")]
    threads: Option<usize>,

    /// Pause after each expanded page, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Timeout of each request, in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Report redirects instead of following them
    #[arg(long)]
    no_redirects: bool,

    /// Skip links that carry a query string
    #[arg(long)]
    no_query_strings: bool,

    /// Policy for links on the seed's domain (ignore, check, follow)
    #[arg(long, value_name = "POLICY")]
    internal: Option<FollowPolicy>,

    /// Policy for links on other domains (ignore, check, follow)
    #[arg(long, value_name = "POLICY")]
    external: Option<FollowPolicy>,

    /// Only check links matching this pattern (repeatable)
    #[arg(long, value_name = "REGEX")]
    include: Vec<String>,

    /// Skip links matching this pattern (repeatable)
    #[arg(long, value_name = "REGEX")]
    exclude: Vec<String>,

    /// Status classes to display, e.g. "4xx,5xx,timeout" or "all"
    #[arg(long, value_name = "CLASSES")]
    show: Option<String>,

    /// Hide internal links from the output
    #[arg(long)]
    hide_internal: bool,

    /// Hide external links from the output
    #[arg(long)]
    hide_external: bool,

    /// Only display links whose URL or source contains TEXT
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Write results as JSON lines
    #[arg(long)]
    json: bool,

    /// Validate options and show what would be scanned without scanning
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid options")?;

    let options = config.crawl_options().context("invalid options")?;
    let rules = config.crawl_rules().context("invalid rules")?;
    let filter = build_filter(&cli)?;

    if cli.dry_run {
        handle_dry_run(&options, &rules, &filter);
        return Ok(());
    }

    let scanner = Scanner::with_user_agent(options, rules, &config.user_agent)
        .context("failed to prepare scan")?;

    let sink: Box<dyn EventSink> = if cli.json {
        Box::new(JsonSink::new(std::io::stdout(), filter))
    } else {
        Box::new(ConsoleSink::new(std::io::stdout(), filter))
    };

    handle_scan(scanner, sink).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_scanner=info,warn"),
            1 => EnvFilter::new("link_scanner=debug,info"),
            2 => EnvFilter::new("link_scanner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Results go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command line flags on top of the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    let scan = &mut config.scan;

    if let Some(url) = &cli.url {
        scan.url = Some(url.clone());
    }
    if let Some(max_depth) = cli.max_depth {
        scan.max_depth = max_depth;
    }
    if let Some(threads) = cli.threads {
        scan.threads = threads;
    }
    if let Some(delay) = cli.delay {
        scan.delay = delay;
    }
    if let Some(timeout) = cli.timeout {
        scan.request_timeout = timeout;
    }
    if cli.no_redirects {
        scan.follow_redirects = false;
    }
    if cli.no_query_strings {
        scan.follow_query_strings = false;
    }
    if let Some(policy) = cli.internal {
        scan.internal_links = policy;
    }
    if let Some(policy) = cli.external {
        scan.external_links = policy;
    }

    let cli_rules = cli
        .include
        .iter()
        .map(|pattern| (RuleCondition::Include, pattern))
        .chain(
            cli.exclude
                .iter()
                .map(|pattern| (RuleCondition::Exclude, pattern)),
        );
    for (condition, pattern) in cli_rules {
        config.rules.push(RuleEntry {
            condition,
            scope: RuleScope::Any,
            pattern: pattern.clone(),
        });
    }
}

fn build_filter(cli: &Cli) -> Result<ResultFilter> {
    let mut filter = ResultFilter::default();

    if let Some(show) = &cli.show {
        filter.classes = ResultFilter::parse_classes(show).map_err(anyhow::Error::msg)?;
    }
    filter.show_internal = !cli.hide_internal;
    filter.show_external = !cli.hide_external;
    filter.search = cli.search.clone();

    Ok(filter)
}

/// Handles the --dry-run mode: shows the effective options and rules
fn handle_dry_run(options: &CrawlOptions, rules: &[CrawlRule], filter: &ResultFilter) {
    println!("=== Link Scanner Dry Run ===\n");

    println!("Scan Options:");
    println!("  Seed URL: {}", options.url);
    println!("  Max depth: {}", options.max_depth);
    println!("  Threads: {}", options.threads);
    println!("  Delay: {}ms", options.delay.as_millis());
    println!("  Request timeout: {}ms", options.timeout.as_millis());
    println!("  Follow redirects: {}", options.follow_redirects);
    println!("  Follow query strings: {}", options.follow_query_strings);
    println!("  Internal links: {}", options.internal);
    println!("  External links: {}", options.external);

    println!("\nRules ({}):", rules.len());
    for rule in rules {
        println!("  - {}", rule);
    }

    let classes: Vec<_> = filter.classes.iter().map(|c| c.to_string()).collect();
    println!("\nDisplaying: {}", classes.join(", "));

    println!("\n✓ Options are valid");
}

/// Handles the main scan operation
async fn handle_scan(scanner: Scanner, mut sink: Box<dyn EventSink>) -> Result<()> {
    tracing::info!(
        "Scanning {} (domain {})",
        scanner.seed(),
        scanner.domain()
    );

    let controller = scanner.controller();
    spawn_interrupt_handler(controller.clone());
    if std::io::stdin().is_terminal() {
        spawn_stdin_controls(controller);
    }

    let mut stats = CrawlStatistics::new();
    let mut session = scanner.start();

    while let Some(event) = session.events.recv().await {
        stats.record(&event);
        sink.handle(&event).context("failed to write result")?;
        if event.is_done() {
            break;
        }
    }

    let outcome = session.handle.await.context("scan task failed")?;
    stats.finish();
    sink.finish(&stats).context("failed to write summary")?;

    match outcome {
        ScanOutcome::Done => tracing::info!("Scan completed"),
        ScanOutcome::Stopped => tracing::warn!("Scan stopped before completion"),
    }

    Ok(())
}

/// Stops the scan on Ctrl-C
fn spawn_interrupt_handler(controller: ScanController) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping scan");
            controller.stop();
        }
    });
}

/// Reads pause/stop commands from the terminal
///
/// Runs on a plain thread: a blocking stdin read must not hold up runtime
/// shutdown.
fn spawn_stdin_controls(controller: ScanController) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };

            match line.trim() {
                "p" | "pause" => match controller.toggle_pause() {
                    ScanState::Paused => eprintln!("Paused, type p to resume"),
                    ScanState::Running => eprintln!("Resumed"),
                    _ => {}
                },
                "s" | "stop" => {
                    controller.stop();
                    break;
                }
                "" => {}
                other => eprintln!("Unknown command '{}': use p (pause) or s (stop)", other),
            }

            if controller.state().is_terminal() {
                break;
            }
        }
    });
}
