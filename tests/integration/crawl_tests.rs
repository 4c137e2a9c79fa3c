//! Integration tests for the scanner
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! scan cycle end-to-end. Each mock server listens on its own port, and the
//! port is part of a link's domain, so a second server stands in for an
//! external site.

use link_scanner::crawler::SkipReason;
use link_scanner::output::{CrawlStatistics, StatusClass};
use link_scanner::{
    CrawlOptions, CrawlRule, FetchError, FollowPolicy, Origin, ResultEvent, RuleScope,
    ScanOutcome, ScanState, Scanner,
};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page answering both HEAD and GET
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// Mounts a non-HTML resource that may only be checked
async fn mount_checked(server: &MockServer, route: &str, expected_heads: u64) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(expected_heads)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<a href=\"/never\">x</a>", "text/html"))
        .expect(0)
        .mount(server)
        .await;
}

fn links_page(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!("<a href=\"{}\">link</a>\n", link))
        .collect();
    format!("<html><body>\n{}</body></html>", anchors)
}

fn options_for(server: &MockServer) -> CrawlOptions {
    CrawlOptions {
        timeout: Duration::from_secs(5),
        ..CrawlOptions::new(format!("{}/", server.uri()))
    }
}

async fn collect(scanner: Scanner) -> (Vec<ResultEvent>, ScanOutcome) {
    let mut session = scanner.start();
    let mut events = Vec::new();
    while let Some(event) = session.events.recv().await {
        events.push(event);
    }
    let outcome = session.handle.await.expect("scan task panicked");
    (events, outcome)
}

fn find<'a>(events: &'a [ResultEvent], route: &str) -> &'a ResultEvent {
    events
        .iter()
        .find(|e| e.link().is_some_and(|l| l.path() == route))
        .unwrap_or_else(|| panic!("no event for {} in {:#?}", route, events))
}

/// Checks the invariants every completed scan must hold
fn assert_well_formed(events: &[ResultEvent]) {
    assert_eq!(events.iter().filter(|e| e.is_done()).count(), 1);
    assert!(events.last().is_some_and(ResultEvent::is_done));

    let mut seen = HashSet::new();
    for event in events.iter().filter(|e| !e.is_done()) {
        let link = event.link().unwrap();
        assert!(link.fragment().is_none(), "fragment in {}", link);
        assert!(seen.insert(link.clone()), "{} reported twice", link);
    }
}

#[tokio::test]
async fn test_internal_follow_external_check() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let site_url = site.uri();
    let other_url = other.uri();

    mount_page(
        &site,
        "/",
        links_page(&[format!("{}/about", site_url), format!("{}/x", other_url)]),
    )
    .await;
    mount_page(&site, "/about", links_page(&[])).await;
    mount_checked(&other, "/x", 1).await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let (events, outcome) = collect(scanner).await;

    assert_eq!(outcome, ScanOutcome::Done);
    assert_eq!(events.len(), 4, "{:#?}", events);
    assert_well_formed(&events);

    // The seed is always processed first
    match &events[0] {
        ResultEvent::Completed {
            status,
            origin,
            source,
            ..
        } => {
            assert_eq!(*status, 200);
            assert_eq!(*origin, Origin::Internal);
            assert!(source.is_none());
        }
        other => panic!("unexpected first event {:?}", other),
    }

    let about = find(&events, "/about");
    assert_eq!(about.origin(), Some(Origin::Internal));
    assert_eq!(about.status(), Some(200));
    assert_eq!(about.source().map(|s| s.path()), Some("/"));

    let external = find(&events, "/x");
    assert_eq!(external.origin(), Some(Origin::External));
    assert_eq!(external.status(), Some(200));
}

#[tokio::test]
async fn test_pdf_rule_skips_links() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let site_url = site.uri();

    mount_page(
        &site,
        "/",
        links_page(&[
            format!("{}/manual.pdf", site_url),
            format!("{}/page", site_url),
            format!("{}/report.pdf", other.uri()),
        ]),
    )
    .await;
    mount_page(&site, "/page", links_page(&[])).await;
    mount_checked(&site, "/manual.pdf", 0).await;
    mount_checked(&other, "/report.pdf", 0).await;

    let rules = vec![CrawlRule::exclude(RuleScope::Any, r"\.pdf$").unwrap()];
    let scanner = Scanner::new(options_for(&site), rules).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    for route in ["/manual.pdf", "/report.pdf"] {
        match find(&events, route) {
            ResultEvent::Skipped { reason, .. } => assert_eq!(*reason, SkipReason::Rule),
            other => panic!("expected {} to be skipped, got {:?}", route, other),
        }
    }
    assert_eq!(find(&events, "/report.pdf").origin(), Some(Origin::External));
    assert_eq!(find(&events, "/page").status(), Some(200));
}

#[tokio::test]
async fn test_fragment_variants_checked_once() {
    let site = MockServer::start().await;
    let site_url = site.uri();

    mount_page(
        &site,
        "/",
        links_page(&[
            format!("{}/page#intro", site_url),
            format!("{}/page#usage", site_url),
            format!("{}/page", site_url),
            "#top".to_string(),
        ]),
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hi</p>", "text/html"))
        .expect(1)
        .mount(&site)
        .await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 3, "{:#?}", events);
}

#[tokio::test]
async fn test_depth_limit_skips_second_hop() {
    let site = MockServer::start().await;
    let hop1 = MockServer::start().await;
    let hop2 = MockServer::start().await;

    mount_page(&site, "/", links_page(&[format!("{}/a", hop1.uri())])).await;
    mount_page(
        &hop1,
        "/a",
        links_page(&[format!("{}/b", hop2.uri()), format!("{}/", site.uri())]),
    )
    .await;
    mount_checked(&hop2, "/b", 0).await;

    let options = CrawlOptions {
        external: FollowPolicy::Follow,
        max_depth: 1,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 4, "{:#?}", events);
    assert_eq!(find(&events, "/a").status(), Some(200));
    match find(&events, "/b") {
        ResultEvent::Skipped { reason, origin, .. } => {
            assert_eq!(*reason, SkipReason::DepthExceeded);
            assert_eq!(*origin, Origin::External);
        }
        other => panic!("expected depth skip, got {:?}", other),
    }
}

#[tokio::test]
async fn test_internal_links_do_not_count_as_hops() {
    let site = MockServer::start().await;
    let site_url = site.uri();

    // A chain of internal pages deeper than max depth
    mount_page(&site, "/", links_page(&[format!("{}/1", site_url)])).await;
    mount_page(&site, "/1", links_page(&[format!("{}/2", site_url)])).await;
    mount_page(&site, "/2", links_page(&[format!("{}/3", site_url)])).await;
    mount_page(&site, "/3", links_page(&[])).await;

    let options = CrawlOptions {
        max_depth: 0,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 5);
    assert!(events
        .iter()
        .filter(|e| !e.is_done())
        .all(|e| e.status() == Some(200)));
}

#[tokio::test]
async fn test_redirect_off_domain_is_external() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let other_url = other.uri();

    mount_page(&site, "/", links_page(&[format!("{}/moved", site.uri())])).await;
    Mock::given(method("HEAD"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("location", format!("{}/landing", other_url).as_str()),
        )
        .mount(&site)
        .await;

    // The landing page links further, but external links are only checked
    mount_page(&other, "/landing", links_page(&[format!("{}/deep", other_url)])).await;
    mount_checked(&other, "/deep", 0).await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 3, "{:#?}", events);
    match find(&events, "/moved") {
        ResultEvent::Completed {
            origin,
            status,
            final_url,
            ..
        } => {
            assert_eq!(*origin, Origin::External);
            assert_eq!(*status, 200);
            assert_eq!(final_url.path(), "/landing");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_redirect_off_domain_expanded_when_following_external() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let other_url = other.uri();

    mount_page(&site, "/", links_page(&[format!("{}/moved", site.uri())])).await;
    Mock::given(method("HEAD"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("location", format!("{}/landing", other_url).as_str()),
        )
        .mount(&site)
        .await;
    mount_page(&other, "/landing", links_page(&[format!("{}/deep", other_url)])).await;
    mount_page(&other, "/deep", links_page(&[])).await;

    let options = CrawlOptions {
        external: FollowPolicy::Follow,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    let deep = find(&events, "/deep");
    assert_eq!(deep.origin(), Some(Origin::External));
    assert_eq!(deep.status(), Some(200));
    assert_eq!(deep.source().map(|s| s.path()), Some("/moved"));
}

#[tokio::test]
async fn test_no_redirects_reports_redirect_status() {
    let site = MockServer::start().await;

    mount_page(&site, "/", links_page(&[format!("{}/old", site.uri())])).await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&site)
        .await;

    let options = CrawlOptions {
        follow_redirects: false,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 3);
    let old = find(&events, "/old");
    assert_eq!(old.status(), Some(301));
    assert_eq!(StatusClass::from_event(old), Some(StatusClass::Redirect));
}

#[tokio::test]
async fn test_broken_links_reported() {
    let site = MockServer::start().await;
    let site_url = site.uri();

    mount_page(
        &site,
        "/",
        links_page(&[format!("{}/missing", site_url), format!("{}/broken", site_url)]),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(find(&events, "/missing").status(), Some(404));
    assert_eq!(find(&events, "/broken").status(), Some(500));

    let mut stats = CrawlStatistics::new();
    events.iter().for_each(|e| stats.record(e));
    assert_eq!(stats.broken_links(), 2);
    assert!(stats.completed);
}

#[tokio::test]
async fn test_timeout_reported_as_error() {
    let site = MockServer::start().await;

    mount_page(&site, "/", links_page(&[format!("{}/slow", site.uri())])).await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&site)
        .await;

    let options = CrawlOptions {
        timeout: Duration::from_millis(300),
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, outcome) = collect(scanner).await;

    assert_eq!(outcome, ScanOutcome::Done);
    assert_well_formed(&events);
    match find(&events, "/slow") {
        ResultEvent::Error { error, origin, .. } => {
            assert_eq!(*error, FetchError::Timeout);
            assert_eq!(*origin, Origin::Internal);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure_does_not_abort_scan() {
    let site = MockServer::start().await;
    // Nothing listens on the port of a dropped listener
    let dead_uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port())
    };

    mount_page(
        &site,
        "/",
        links_page(&[format!("{}/gone", dead_uri), format!("{}/ok", site.uri())]),
    )
    .await;
    mount_page(&site, "/ok", links_page(&[])).await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let (events, outcome) = collect(scanner).await;

    assert_eq!(outcome, ScanOutcome::Done);
    assert_well_formed(&events);
    assert!(matches!(
        find(&events, "/gone"),
        ResultEvent::Error {
            origin: Origin::External,
            ..
        }
    ));
    assert_eq!(find(&events, "/ok").status(), Some(200));
}

#[tokio::test]
async fn test_policy_skips() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let site_url = site.uri();

    mount_page(
        &site,
        "/",
        links_page(&[
            format!("{}/search?q=rust", site_url),
            format!("{}/elsewhere", other.uri()),
            "ftp://files.example.org/archive.zip".to_string(),
            "mailto:webmaster@example.com".to_string(),
            "javascript:void(0)".to_string(),
        ]),
    )
    .await;
    mount_checked(&other, "/elsewhere", 0).await;

    let options = CrawlOptions {
        follow_query_strings: false,
        external: FollowPolicy::Ignore,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    // seed, three skips, done; mailto and javascript are dropped silently
    assert_eq!(events.len(), 5, "{:#?}", events);

    let reasons: HashSet<SkipReason> = events
        .iter()
        .filter_map(|e| match e {
            ResultEvent::Skipped { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        HashSet::from([
            SkipReason::QueryString,
            SkipReason::ExternalIgnored,
            SkipReason::UnsupportedScheme
        ])
    );
}

#[tokio::test]
async fn test_internal_check_does_not_expand() {
    let site = MockServer::start().await;
    let site_url = site.uri();

    mount_page(&site, "/", links_page(&[format!("{}/a", site_url)])).await;
    mount_checked(&site, "/a", 1).await;

    let options = CrawlOptions {
        internal: FollowPolicy::Check,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn test_single_worker_processes_every_link() {
    let site = MockServer::start().await;
    let site_url = site.uri();

    mount_page(
        &site,
        "/",
        links_page(&[format!("{}/one", site_url), format!("{}/two", site_url)]),
    )
    .await;
    mount_page(&site, "/one", links_page(&[])).await;
    mount_page(&site, "/two", links_page(&[])).await;

    let options = CrawlOptions {
        threads: 1,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let (events, _) = collect(scanner).await;

    assert_well_formed(&events);
    assert_eq!(events.len(), 4);
    find(&events, "/one");
    find(&events, "/two");
}

async fn mount_small_site(site: &MockServer) {
    let site_url = site.uri();
    mount_page(
        site,
        "/",
        links_page(&[
            format!("{}/a", site_url),
            format!("{}/b", site_url),
            format!("{}/c", site_url),
        ]),
    )
    .await;
    mount_page(site, "/a", links_page(&[format!("{}/d", site_url)])).await;
    mount_page(site, "/b", links_page(&[format!("{}/d", site_url)])).await;
    mount_page(site, "/c", links_page(&[])).await;
    mount_page(site, "/d", links_page(&[])).await;
}

#[tokio::test]
async fn test_pause_resume_loses_no_events() {
    let site = MockServer::start().await;
    mount_small_site(&site).await;

    let options = CrawlOptions {
        threads: 3,
        ..options_for(&site)
    };

    let (baseline, _) = collect(Scanner::new(options.clone(), vec![]).unwrap()).await;

    let scanner = Scanner::new(options, vec![]).unwrap();
    let mut session = scanner.start();
    assert!(session.controller.pause());

    // Nothing is processed while paused
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(session.events.try_recv().is_err());
    assert_eq!(session.controller.state(), ScanState::Paused);

    assert_eq!(session.controller.toggle_pause(), ScanState::Running);

    let mut events = Vec::new();
    while let Some(event) = session.events.recv().await {
        // Pause again mid-scan, then resume
        if events.len() == 1 {
            session.controller.pause();
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.controller.resume();
        }
        events.push(event);
    }

    assert_eq!(session.handle.await.unwrap(), ScanOutcome::Done);
    assert_well_formed(&events);
    assert_eq!(events.len(), baseline.len());
    assert_eq!(events.len(), 6);
}

#[tokio::test]
async fn test_stop_ends_without_done() {
    let site = MockServer::start().await;
    let site_url = site.uri();

    mount_page(
        &site,
        "/",
        links_page(&[format!("{}/slow1", site_url), format!("{}/slow2", site_url)]),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/slow1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/slow2"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&site)
        .await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let mut session = scanner.start();

    let first = session.events.recv().await.unwrap();
    assert_eq!(first.status(), Some(200));
    assert!(session.controller.stop());

    let mut rest = Vec::new();
    while let Some(event) = session.events.recv().await {
        rest.push(event);
    }

    let outcome = tokio::time::timeout(Duration::from_secs(1), session.handle)
        .await
        .expect("stopped scan did not exit promptly")
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Stopped);
    assert!(rest.iter().all(|e| !e.is_done()));
    assert_eq!(session.controller.state(), ScanState::Stopped);
}

#[tokio::test]
async fn test_delay_paces_each_expanded_page() {
    let site = MockServer::start().await;
    mount_page(&site, "/", links_page(&[format!("{}/page", site.uri())])).await;
    // No links on this page, it is still paced
    mount_page(&site, "/page", links_page(&[])).await;

    let delay = Duration::from_millis(300);
    let options = CrawlOptions {
        delay,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();

    let started = std::time::Instant::now();
    let (events, outcome) = collect(scanner).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, ScanOutcome::Done);
    assert_well_formed(&events);
    assert_eq!(events.len(), 3);
    assert!(elapsed >= delay * 2, "finished after {:?}", elapsed);
}

#[tokio::test]
async fn test_delay_applies_to_page_without_links() {
    let site = MockServer::start().await;
    mount_page(&site, "/", links_page(&[])).await;

    let delay = Duration::from_millis(300);
    let options = CrawlOptions {
        delay,
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();

    let started = std::time::Instant::now();
    let (events, _) = collect(scanner).await;

    assert_eq!(events.len(), 2);
    assert!(started.elapsed() >= delay);
}

#[tokio::test]
async fn test_stop_interrupts_delay() {
    let site = MockServer::start().await;
    mount_page(&site, "/", links_page(&[format!("{}/page", site.uri())])).await;
    mount_page(&site, "/page", links_page(&[])).await;

    let options = CrawlOptions {
        delay: Duration::from_secs(30),
        ..options_for(&site)
    };
    let scanner = Scanner::new(options, vec![]).unwrap();
    let mut session = scanner.start();

    let first = session.events.recv().await.unwrap();
    assert_eq!(first.link().unwrap().path(), "/");
    assert!(session.controller.stop());

    let outcome = tokio::time::timeout(Duration::from_secs(2), session.handle)
        .await
        .expect("stop did not interrupt the delay")
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Stopped);

    while let Some(event) = session.events.recv().await {
        assert!(!event.is_done());
    }
}

#[tokio::test]
async fn test_stop_while_paused() {
    let site = MockServer::start().await;
    mount_small_site(&site).await;

    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let mut session = scanner.start();
    session.controller.pause();
    session.controller.stop();

    assert_eq!(session.handle.await.unwrap(), ScanOutcome::Stopped);
    let mut count = 0;
    while let Some(event) = session.events.recv().await {
        assert!(!event.is_done());
        count += 1;
    }
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_run_on_current_task() {
    let site = MockServer::start().await;
    mount_page(&site, "/", links_page(&[])).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scanner = Scanner::new(options_for(&site), vec![]).unwrap();
    let controller = scanner.controller();

    assert_eq!(scanner.run(tx).await, ScanOutcome::Done);
    assert_eq!(controller.state(), ScanState::Done);
    assert_eq!(rx.recv().await.unwrap().status(), Some(200));
    assert!(rx.recv().await.unwrap().is_done());
    assert!(rx.recv().await.is_none());
}

#[test]
fn test_invalid_seed_fails_before_start() {
    for seed in ["", "ftp://example.com/", "http://"] {
        let result = Scanner::new(CrawlOptions::new(seed), vec![]);
        assert!(result.is_err(), "{:?} accepted", seed);
    }
}

#[test]
fn test_invalid_rule_pattern_is_rejected() {
    assert!(CrawlRule::exclude(RuleScope::Any, "([a-z]").is_err());
}
