//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! fetching, politeness and the full batch loop end-to-end.

use std::sync::Arc;
use std::time::{Duration, Instant};
use wiki_trawl::config::Config;
use wiki_trawl::crawler::{
    build_http_client, FetchResult, Fetcher, RedirectScope, RequestRate, RetryPolicy, Throttler,
};
use wiki_trawl::robots::RobotsPolicy;
use wiki_trawl::url::LinkFilter;
use wiki_trawl::storage::{DocumentStore, SqliteStore, StateStore};
use wiki_trawl::{CrawlOrchestrator, CrawlPhase, StopReason};
use wiremock::matchers::{method, path};
use url::Url;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = format!("{}/wiki/Main_Page", base_url);
    config.crawler.site_base = base_url.to_string();
    config.crawler.requests_per_second = 100;
    config.crawler.time_period_ms = 10;
    config.crawler.batch_size = 2;
    config.crawler.max_scraped_count = 4;
    config.crawler.retry_backoff_ms = 10;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(format!(
            r#"<html><head><title>{title}</title></head><body>
            <h1 id="firstHeading">{title}</h1><p>Articles about {title}.</p>{anchors}
            </body></html>"#
        ))
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn test_fetcher(config: &Config, rate: RequestRate) -> Fetcher {
    let client = build_http_client(config).unwrap();
    Fetcher::new(
        client,
        Arc::new(Throttler::new(rate)),
        RetryPolicy::new(5, Duration::from_millis(10)),
    )
}

fn fast_rate() -> RequestRate {
    RequestRate::new(100, Duration::from_millis(10))
}

fn stores() -> (SqliteStore, SqliteStore) {
    (
        SqliteStore::open_in_memory().unwrap(),
        SqliteStore::open_in_memory().unwrap(),
    )
}

#[tokio::test]
async fn test_retry_until_success() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    Mock::given(method("GET"))
        .and(path("/wiki/A"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(5)
        .expect(5)
        .mount(&server)
        .await;
    mount_page(&server, "/wiki/A", page("A", &[]), 1).await;

    let fetcher = test_fetcher(&config, fast_rate());
    let result = fetcher.fetch(&format!("{}/wiki/A", server.uri())).await;

    assert!(result.is_success(), "Expected success, got {:?}", result);
    assert_eq!(fetcher.throttler().granted(), 6);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    Mock::given(method("GET"))
        .and(path("/wiki/A"))
        .respond_with(ResponseTemplate::new(429))
        .expect(6)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(&config, fast_rate());
    let result = fetcher.fetch(&format!("{}/wiki/A", server.uri())).await;

    match result {
        FetchResult::RetriesExhausted {
            status_code,
            attempts,
            ..
        } => {
            assert_eq!(status_code, 429);
            assert_eq!(attempts, 6);
        }
        other => panic!("Expected exhausted retries, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unavailable_then_success() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    Mock::given(method("GET"))
        .and(path("/wiki/A"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/wiki/A", page("A", &[]), 1).await;

    let fetcher = test_fetcher(&config, fast_rate());
    let result = fetcher.fetch(&format!("{}/wiki/A", server.uri())).await;

    assert!(result.is_success());
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    mount_page(&server, "/wiki/Missing", ResponseTemplate::new(404), 1).await;

    let fetcher = test_fetcher(&config, fast_rate());
    let result = fetcher
        .fetch(&format!("{}/wiki/Missing", server.uri()))
        .await;

    assert!(matches!(
        result,
        FetchResult::HttpError {
            status_code: 404,
            ..
        }
    ));
}

#[tokio::test]
async fn test_single_redirect_followed() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    mount_page(
        &server,
        "/wiki/Old",
        ResponseTemplate::new(301).insert_header("location", "/wiki/New"),
        1,
    )
    .await;
    mount_page(&server, "/wiki/New", page("New", &[]), 1).await;

    let fetcher = test_fetcher(&config, fast_rate());
    let url = format!("{}/wiki/Old", server.uri());
    let result = fetcher.fetch(&url).await;

    match result {
        FetchResult::Success {
            url: requested,
            final_url,
            status_code,
            ..
        } => {
            assert_eq!(requested, url);
            assert_eq!(final_url, format!("{}/wiki/New", server.uri()));
            assert_eq!(status_code, 200);
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_second_redirect_not_followed() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    mount_page(
        &server,
        "/wiki/A",
        ResponseTemplate::new(302).insert_header("location", "/wiki/B"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/wiki/B",
        ResponseTemplate::new(302).insert_header("location", "/wiki/C"),
        1,
    )
    .await;
    mount_page(&server, "/wiki/C", page("C", &[]), 0).await;

    let fetcher = test_fetcher(&config, fast_rate());
    let result = fetcher.fetch(&format!("{}/wiki/A", server.uri())).await;

    assert!(matches!(
        result,
        FetchResult::HttpError {
            status_code: 302,
            ..
        }
    ));
    assert_eq!(fetcher.throttler().granted(), 2);
}

#[tokio::test]
async fn test_redirect_outside_scope_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let config = create_test_config(&server.uri());

    mount_page(
        &server,
        "/wiki/Hidden",
        ResponseTemplate::new(302).insert_header("location", "/wiki/Secret"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/wiki/Away",
        ResponseTemplate::new(301)
            .insert_header("location", format!("{}/wiki/Away", other.uri()).as_str()),
        1,
    )
    .await;
    mount_page(&server, "/wiki/Secret", page("Secret", &[]), 0).await;
    mount_page(&other, "/wiki/Away", page("Away", &[]), 0).await;

    let robots = RobotsPolicy::from_content("User-agent: *\nDisallow: /wiki/Secret\n", "TestBot");
    let filter = LinkFilter::new(Url::parse(&server.uri()).unwrap(), "/wiki/");
    let fetcher =
        test_fetcher(&config, fast_rate()).with_redirect_scope(RedirectScope::new(filter, robots));

    let result = fetcher.fetch(&format!("{}/wiki/Hidden", server.uri())).await;
    assert!(matches!(
        result,
        FetchResult::HttpError {
            status_code: 302,
            ..
        }
    ));

    let result = fetcher.fetch(&format!("{}/wiki/Away", server.uri())).await;
    assert!(matches!(
        result,
        FetchResult::HttpError {
            status_code: 301,
            ..
        }
    ));
    assert_eq!(fetcher.throttler().granted(), 2);
}

#[tokio::test]
async fn test_network_error_is_failure() {
    let config = create_test_config("http://127.0.0.1:9");
    let fetcher = test_fetcher(&config, fast_rate());

    let result = fetcher.fetch("http://127.0.0.1:9/wiki/A").await;

    assert!(matches!(result, FetchResult::NetworkError { .. }));
    assert_eq!(result.status_code(), None);
}

#[tokio::test]
async fn test_batch_respects_rate_limit() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let start = Instant::now();
    let fetcher = test_fetcher(&config, RequestRate::new(3, Duration::from_millis(100)));
    let urls: Vec<String> = (0..7)
        .map(|i| format!("{}/wiki/{}", server.uri(), i))
        .collect();

    let results = futures::future::join_all(urls.iter().map(|url| fetcher.fetch(url))).await;

    assert!(results.iter().all(FetchResult::is_success));
    // ceil(7 / 3) * 100ms
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_robots_load_failure_allows_all() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = build_http_client(&config).unwrap();
    let site = url::Url::parse(&server.uri()).unwrap();
    let policy = RobotsPolicy::load(&client, &site, "TestBot").await;

    assert!(policy.is_allowed("/wiki/Anything"));
    assert_eq!(policy.suggested_rate(), None);
}

#[tokio::test]
async fn test_robots_unreachable_allows_all() {
    let config = create_test_config("http://127.0.0.1:9");
    let client = build_http_client(&config).unwrap();
    let site = url::Url::parse("http://127.0.0.1:9").unwrap();

    let policy = RobotsPolicy::load(&client, &site, "TestBot").await;

    assert!(policy.is_allowed("/wiki/Anything"));
}

#[tokio::test]
async fn test_robots_rate_narrows_throttle() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());
    mount_robots(&server, "User-agent: *\nCrawl-delay: 2\n").await;

    let (state, docs) = stores();
    let orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();

    assert_eq!(
        orchestrator.throttler().rate(),
        RequestRate::new(1, Duration::from_secs(2))
    );
    assert_eq!(orchestrator.phase(), CrawlPhase::Initializing);
}

#[tokio::test]
async fn test_cold_start_crawl() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());
    mount_robots(&server, "User-agent: *\nDisallow: /wiki/Secret\n").await;

    mount_page(
        &server,
        "/wiki/Main_Page",
        page(
            "Main Page",
            &[
                "/wiki/A",
                "/wiki/B",
                "/wiki/Special:Search",
                "/wiki/Talk:Main_Page",
                "/wiki/Secret",
                "https://other.example.org/wiki/X",
                "/wiki/C",
                "/wiki/A#History",
            ],
        ),
        1,
    )
    .await;
    mount_page(&server, "/wiki/A", page("A", &["/wiki/Main_Page"]), 1).await;
    mount_page(&server, "/wiki/B", page("B", &[]), 1).await;
    mount_page(&server, "/wiki/C", page("C", &[]), 1).await;
    mount_page(&server, "/wiki/Secret", page("Secret", &[]), 0).await;

    let (state, docs) = stores();
    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();
    let report = orchestrator.run().await.unwrap();

    // [Main_Page], [A, B], [C]
    assert_eq!(report.batches, 3);
    assert_eq!(report.visited_count, 4);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.stop_reason, Some(StopReason::LimitReached));
    assert_eq!(report.documents_saved, 4);
    assert_eq!(report.links_enqueued, 3);
    assert_eq!(
        orchestrator.phase(),
        CrawlPhase::Stopped(StopReason::LimitReached)
    );

    let (state, docs) = orchestrator.into_stores();
    let visited = state.load_visited().unwrap();
    assert_eq!(visited.len(), 4);
    assert!(!visited.contains(&format!("{}/wiki/Secret", server.uri())));

    let pending = state.load_pending().unwrap();
    assert_eq!(
        pending,
        vec![
            format!("{}/wiki/Main_Page", server.uri()),
            format!("{}/wiki/A", server.uri()),
            format!("{}/wiki/B", server.uri()),
            format!("{}/wiki/C", server.uri()),
        ]
    );
    assert_eq!(docs.count_documents().unwrap(), 4);
    assert!(docs.count_words().unwrap() > 0);
}

#[tokio::test]
async fn test_resumed_batches_stop_at_limit() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    let main_page = format!("{}/wiki/Main_Page", server.uri());
    let a = format!("{}/wiki/A", server.uri());

    mount_page(&server, "/wiki/Main_Page", page("Main", &["/wiki/B"]), 1).await;
    mount_page(&server, "/wiki/A", page("A", &["/wiki/C", "/wiki/D"]), 1).await;
    mount_page(&server, "/wiki/B", page("B", &[]), 1).await;
    mount_page(&server, "/wiki/C", page("C", &[]), 1).await;
    mount_page(&server, "/wiki/D", page("D", &[]), 0).await;

    let (mut state, docs) = stores();
    state.dump_pending(&[main_page, a]).unwrap();

    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();
    let report = orchestrator.run().await.unwrap();

    // [Main_Page, A] -> visited 2; [B, C] -> visited 4; no third batch
    assert_eq!(report.batches, 2);
    assert_eq!(report.visited_count, 4);
    assert_eq!(report.stop_reason, Some(StopReason::LimitReached));
    assert_eq!(orchestrator.frontier().len(), 1);

    // D was discovered in a completed batch, so it is durable for the next run
    let (state, _) = orchestrator.into_stores();
    assert!(state
        .load_pending()
        .unwrap()
        .contains(&format!("{}/wiki/D", server.uri())));
}

#[tokio::test]
async fn test_resume_never_refetches_visited() {
    let server = MockServer::start().await;
    let mut config = create_test_config(&server.uri());
    config.crawler.max_scraped_count = 100;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    let url = |p: &str| format!("{}{}", server.uri(), p);

    mount_page(&server, "/wiki/Main_Page", page("Main", &[]), 0).await;
    mount_page(&server, "/wiki/A", page("A", &[]), 0).await;
    mount_page(&server, "/wiki/B", page("B", &["/wiki/A", "/wiki/C"]), 1).await;
    mount_page(&server, "/wiki/C", page("C", &["/wiki/Main_Page"]), 1).await;

    let (mut state, docs) = stores();
    state
        .dump_visited(&[url("/wiki/Main_Page"), url("/wiki/A")])
        .unwrap();
    state
        .dump_pending(&[url("/wiki/Main_Page"), url("/wiki/A"), url("/wiki/B")])
        .unwrap();

    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();
    assert_eq!(orchestrator.frontier().len(), 1);

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.visited_count, 2);
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
}

#[tokio::test]
async fn test_failed_fetch_is_recorded_as_visited() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    mount_page(&server, "/wiki/Main_Page", page("Main", &["/wiki/Gone"]), 1).await;
    mount_page(&server, "/wiki/Gone", ResponseTemplate::new(404), 1).await;

    let (state, docs) = stores();
    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();
    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.documents_saved, 1);
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));

    let (state, _) = orchestrator.into_stores();
    assert!(state
        .load_visited()
        .unwrap()
        .contains(&format!("{}/wiki/Gone", server.uri())));
}

#[tokio::test]
async fn test_crawl_skips_disallowed_and_offsite_redirects() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let config = create_test_config(&server.uri());
    mount_robots(&server, "User-agent: *\nDisallow: /wiki/Secret\n").await;

    mount_page(
        &server,
        "/wiki/Main_Page",
        page("Main", &["/wiki/Hidden", "/wiki/Away"]),
        1,
    )
    .await;
    mount_page(
        &server,
        "/wiki/Hidden",
        ResponseTemplate::new(302).insert_header("location", "/wiki/Secret"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/wiki/Away",
        ResponseTemplate::new(302)
            .insert_header("location", format!("{}/wiki/Main_Page", other.uri()).as_str()),
        1,
    )
    .await;
    mount_page(&server, "/wiki/Secret", page("Secret", &[]), 0).await;
    mount_page(&other, "/wiki/Main_Page", page("Impostor", &[]), 0).await;

    let (state, docs) = stores();
    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();
    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.documents_saved, 1);
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));

    let (_, docs) = orchestrator.into_stores();
    assert_eq!(docs.count_documents().unwrap(), 1);
}

#[tokio::test]
async fn test_interrupt_discards_in_flight_batch() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri());
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    Mock::given(method("GET"))
        .and(path("/wiki/Main_Page"))
        .respond_with(page("Main", &["/wiki/A"]).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let (state, docs) = stores();
    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();
    let report = orchestrator
        .run_until(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::Interrupted));
    assert_eq!(report.visited_count, 0);
    assert_eq!(report.batches, 0);

    let (state, docs) = orchestrator.into_stores();
    assert!(state.load_visited().unwrap().is_empty());
    assert_eq!(
        state.load_pending().unwrap(),
        vec![format!("{}/wiki/Main_Page", server.uri())]
    );
    assert_eq!(docs.count_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_stopped_orchestrator_cannot_rerun() {
    let server = MockServer::start().await;
    let mut config = create_test_config(&server.uri());
    config.crawler.max_scraped_count = 0;

    let (state, docs) = stores();
    let mut orchestrator = CrawlOrchestrator::initialize(&config, state, docs)
        .await
        .unwrap();

    let report = orchestrator.run().await.unwrap();
    assert_eq!(report.stop_reason, Some(StopReason::LimitReached));
    assert_eq!(report.batches, 0);

    assert!(orchestrator.run().await.is_err());
}
