//! Integration tests for the scanner
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! scans end-to-end.

use recon_scan::config::{ScanConfig, ScanConfigBuilder, ScopeMode};
use recon_scan::crawler::FetchStatus;
use recon_scan::{ScanState, Scanner};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Small, fast settings shared by every test
fn test_config(start_url: &str) -> ScanConfigBuilder {
    ScanConfig::builder(start_url)
        .workers(2)
        .timeout_secs(5)
        .external_join_timeout_secs(5)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn run_scan(config: ScanConfig) -> recon_scan::ScanReport {
    let scanner = Scanner::new(config).expect("Failed to create scanner");
    let report = tokio::time::timeout(Duration::from_secs(30), scanner.run())
        .await
        .expect("Scan did not finish")
        .expect("Scan failed");
    assert_eq!(scanner.state(), ScanState::Done);
    report
}

#[tokio::test]
async fn test_full_scan_visits_internal_and_external_once() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let site_port = site.address().port();
    let other_port = other.address().port();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="/a">Page A</a>
            <script src="//127.0.0.1:{site_port}/b.js"></script>
            <a href="http://localhost:{other_port}/c">Partner</a>
            </body></html>"#
        )))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"<html><head><title>Page A</title></head><body>
            <a href="/">Home</a>
            <p>Contact: admin@example.com</p>
            </body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/b.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("var endpoint = \"/api/v1/users\";")
                .insert_header("content-type", "application/javascript"),
        )
        .expect(1)
        .mount(&site)
        .await;

    // External page: fetched once, its links never followed
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html(
            r#"<html><head><title>Partner</title></head><body>
            <a href="/d">Deeper</a>
            </body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&other)
        .await;

    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&other)
        .await;

    let config = test_config(&format!("http://127.0.0.1:{site_port}/"))
        .scope(ScopeMode::MainDomainOnly)
        .build()
        .unwrap();
    let report = run_scan(config).await;

    let urls: Vec<String> = report.results.iter().map(|r| r.url.to_string()).collect();
    assert!(urls.contains(&format!("http://127.0.0.1:{site_port}/")));
    assert!(urls.contains(&format!("http://127.0.0.1:{site_port}/a")));
    assert!(urls.contains(&format!("http://127.0.0.1:{site_port}/b.js")));
    assert!(urls.contains(&format!("http://localhost:{other_port}/c")));

    let home = report
        .results
        .iter()
        .find(|r| r.url.path() == "/" && r.url.port() == Some(site_port))
        .unwrap();
    assert_eq!(home.status, FetchStatus::Code(200));
    assert_eq!(home.title, "Home");
    assert_eq!(home.depth, 0);

    let page_a = report.results.iter().find(|r| r.url.path() == "/a").unwrap();
    assert_eq!(page_a.depth, 1);
    assert!(page_a
        .findings
        .iter()
        .any(|f| f.pattern_name == "email"));

    assert!(report.unvisited_external.is_empty());
    assert_eq!(report.statistics.external_discovered, 1);
    assert!(report.statistics.requests_issued >= 4);
}

#[tokio::test]
async fn test_dangerous_url_recorded_once_and_never_fetched() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <a href="/user/delete?id=1">Delete</a>
            <a href="/profile">Profile</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(html(
            r#"<html><body><a href="/user/delete?id=1">Delete</a></body></html>"#.to_string(),
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/delete"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&site)
        .await;

    let report = run_scan(test_config(&format!("{base}/")).build().unwrap()).await;

    assert_eq!(report.dangerous_urls, vec![format!("{base}/user/delete?id=1")]);
    assert_eq!(report.statistics.dangerous_urls, 1);
    assert!(report
        .results
        .iter()
        .all(|r| !r.url.path().contains("delete")));
}

#[tokio::test]
async fn test_request_budget_stops_scan() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <a href="/one">1</a>
            <a href="/two">2</a>
            <a href="/three">3</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<html><title>Leaf</title></html>".to_string()))
        .mount(&site)
        .await;

    let config = test_config(&format!("{base}/"))
        .max_requests(2)
        .build()
        .unwrap();
    let report = run_scan(config).await;

    let received = site.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(report.statistics.requests_issued, 2);
    assert_eq!(report.results.len(), 2);
}

#[tokio::test]
async fn test_max_depth_limits_recursion() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/level1">1</a>"#.to_string()))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/level1"))
        .respond_with(html(r#"<a href="/level2">2</a>"#.to_string()))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&site)
        .await;

    let config = test_config(&format!("{base}/"))
        .max_depth(1)
        .build()
        .unwrap();
    let report = run_scan(config).await;

    assert_eq!(report.results.len(), 2);
}

#[tokio::test]
async fn test_whitelist_only_never_leaves_scope() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let site_port = site.address().port();
    let other_port = other.address().port();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<a href="http://localhost:{other_port}/elsewhere">Out</a>"#
        )))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&other)
        .await;

    let config = test_config(&format!("http://127.0.0.1:{site_port}/"))
        .scope(ScopeMode::WhitelistOnly)
        .build()
        .unwrap();
    let report = run_scan(config).await;

    assert_eq!(
        report.unvisited_external,
        vec![format!("http://localhost:{other_port}/elsewhere")]
    );
}

#[tokio::test]
async fn test_status_filter_and_csv_report() {
    let site = MockServer::start().await;
    let base = site.uri();
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("report.csv");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><title>Home</title><a href="/missing">gone</a></html>"#.to_string(),
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;

    let config = test_config(&format!("{base}/"))
        .status_filter(404)
        .csv_path(csv_path.display().to_string())
        .build()
        .unwrap();
    let report = run_scan(config).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, FetchStatus::Code(200));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(&format!("{base}/,200,Home")));
}

#[tokio::test]
async fn test_redirect_out_of_scope_is_not_followed() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let site_port = site.address().port();
    let other_port = other.address().port();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("http://localhost:{other_port}/landing").as_str()),
        )
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(html(
            r#"<html><title>Landing</title><a href="/deeper">Deeper</a></html>"#.to_string(),
        ))
        .expect(1)
        .mount(&other)
        .await;

    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&other)
        .await;

    let config = test_config(&format!("http://127.0.0.1:{site_port}/"))
        .build()
        .unwrap();
    let report = run_scan(config).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.results[0].url.as_str(),
        format!("http://localhost:{other_port}/landing")
    );
    assert_eq!(report.results[0].redirects.len(), 1);
}

#[tokio::test]
async fn test_stop_mid_scan_still_finalizes() {
    let site = MockServer::start().await;
    let base = site.uri();
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("report.csv");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><title>Home</title>
            <a href="/slow">Slow</a>
            <a href="/logout">Log out</a>
            </html>"#
                .to_string(),
        ))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<html></html>".to_string()).set_delay(Duration::from_secs(20)))
        .mount(&site)
        .await;

    let config = test_config(&format!("{base}/"))
        .timeout_secs(30)
        .csv_path(csv_path.display().to_string())
        .build()
        .unwrap();
    let scanner = Scanner::new(config).unwrap();
    let stop = scanner.stop_handle();

    let started = std::time::Instant::now();
    let cancel_later = async {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        stop.cancel();
    };
    let (report, ()) = tokio::join!(
        tokio::time::timeout(Duration::from_secs(10), scanner.run()),
        cancel_later
    );
    let report = report.expect("Scan did not stop").expect("Scan failed");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(scanner.state(), ScanState::Done);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.dangerous_urls, vec![format!("{base}/logout")]);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv
        .lines()
        .any(|line| line.starts_with(&format!("{base}/logout,DANGEROUS"))));
}
