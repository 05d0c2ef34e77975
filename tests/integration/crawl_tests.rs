//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from TOML configuration to CSV file.

use async_trait::async_trait;
use roster_sweep::config::{parse_config, Config};
use roster_sweep::crawler::{Coordinator, ListingDriver};
use roster_sweep::output::{CrawlEvent, CsvSink, MemoryEventSink};
use roster_sweep::{run_crawl, CrawlSummary, SweepError};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a one-site configuration whose listing and profiles live on `server`
fn template_config(server: &MockServer, workers: usize) -> Config {
    let toml = format!(
        r#"
[http]
user-agent = "roster-sweep-tests"
detail-timeout-secs = 1
listing-timeout-secs = 5

[[site]]
name = "mock"
base-url = "{uri}"
workers = {workers}
politeness-delay-ms = [0, 5]

[site.discovery]
strategy = "template"
url-template = "{uri}/agents?page={{page}}"
card-selector = "a.agent"

[site.card-fields]
name = [{{ selector = "span.card-name" }}]

[site.detail-fields]
name = [{{ selector = "h1.name" }}, {{ selector = "aside h3" }}]
role = [{{ selector = "p.title" }}]
phone = [
    {{ selector = "a[href]", attr = "href", prefix = "tel:" }},
    {{ pattern = '(?:\+?90\s*)?0?\s*5\d{{2}}\s*\d{{3}}\s*\d{{2}}\s*\d{{2}}', phone = true }},
]
email = [
    {{ selector = "a[href]", attr = "href", prefix = "mailto:", contains = "@" }},
    {{ pattern = '[\w.-]+@[\w.-]+\.\w+' }},
]
"#,
        uri = server.uri(),
        workers = workers,
    );
    parse_config(&toml).unwrap()
}

fn listing_page(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a class="agent" href="/agent/{id}"><span class="card-name">Card {id}</span></a>"#,
                id = id
            )
        })
        .collect();
    format!("<html><body><div class=\"grid\">{}</div></body></html>", cards)
}

fn profile_page(name: &str, extra: &str) -> String {
    format!(
        r#"<html><body><h1 class="name">{}</h1><p class="title">Danışman</p>{}</body></html>"#,
        name, extra
    )
}

async fn mount_listing(server: &MockServer, page: u32, ids: &[u32]) {
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

async fn mount_profile(server: &MockServer, id: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/agent/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn crawl(config: &Config, dir: &TempDir, events: &MemoryEventSink) -> CrawlSummary {
    let sink = CsvSink::new(dir.path(), false);
    run_crawl(
        &config.sites[0],
        &config.http,
        &sink,
        events,
        &CancellationToken::new(),
    )
    .await
    .unwrap()
}

fn read_rows(summary: &CrawlSummary) -> Vec<Vec<String>> {
    let path = summary.output.as_ref().unwrap();
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_three_page_listing_stops_on_empty_page() {
    let server = MockServer::start().await;
    let first: Vec<u32> = (1..=10).collect();
    let second: Vec<u32> = (11..=20).collect();
    mount_listing(&server, 1, &first).await;
    mount_listing(&server, 2, &second).await;
    mount_listing(&server, 3, &[]).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[99])))
        .expect(0)
        .mount(&server)
        .await;
    for id in 1..=20 {
        mount_profile(&server, id, profile_page(&format!("Agent {:02}", id), "")).await;
    }

    let config = template_config(&server, 5);
    let dir = TempDir::new().unwrap();
    let events = MemoryEventSink::new();
    let summary = crawl(&config, &dir, &events).await;

    assert_eq!(summary.links_discovered, 20);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.count, 20);
    assert_eq!(summary.fetch_failures, 0);
    assert!(!summary.is_partial());

    let rows = read_rows(&summary);
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[0][0], "1");
    assert_eq!(rows[0][1], "Agent 01");
    assert_eq!(rows[19][0], "2");
    assert_eq!(rows[19][1], "Agent 20");
    assert_eq!(
        events.count(|e| matches!(e, CrawlEvent::ListingPage { .. })),
        2
    );
}

#[tokio::test]
async fn test_one_timeout_one_success_yields_one_record() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, &[1, 2]).await;
    mount_listing(&server, 2, &[]).await;
    Mock::given(method("GET"))
        .and(path("/agent/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(profile_page("Slow Agent", ""))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_profile(&server, 2, profile_page("Fast Agent", "")).await;

    let config = template_config(&server, 2);
    let dir = TempDir::new().unwrap();
    let events = MemoryEventSink::new();
    let summary = crawl(&config, &dir, &events).await;

    assert_eq!(summary.count, 1);
    assert_eq!(summary.fetch_failures, 1);
    assert!(!summary.is_partial());

    let rows = read_rows(&summary);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "Fast Agent");
    assert_eq!(
        events.count(|e| matches!(e, CrawlEvent::FetchFailed { .. })),
        1
    );
}

#[tokio::test]
async fn test_email_mailto_pattern_and_absent() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, &[1, 2, 3]).await;
    mount_listing(&server, 2, &[]).await;
    mount_profile(
        &server,
        1,
        profile_page(
            "A Mailto",
            r#"<a href="mailto:?subject=paylas">Paylaş</a><a href="mailto:mailto.agent@example.com.tr">E-posta</a>"#,
        ),
    )
    .await;
    mount_profile(
        &server,
        2,
        profile_page("B Pattern", "<p>İletişim: pattern.agent@example.org</p>"),
    )
    .await;
    mount_profile(&server, 3, profile_page("C None", "<p>Bilgi yok</p>")).await;

    let config = template_config(&server, 3);
    let dir = TempDir::new().unwrap();
    let summary = crawl(&config, &dir, &MemoryEventSink::new()).await;

    let rows = read_rows(&summary);
    let emails: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r[1].as_str(), r[4].as_str()))
        .collect();
    assert_eq!(
        emails,
        vec![
            ("A Mailto", "mailto.agent@example.com.tr"),
            ("B Pattern", "pattern.agent@example.org"),
            ("C None", ""),
        ]
    );
}

#[tokio::test]
async fn test_phone_tel_link_and_normalized_pattern() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, &[1, 2]).await;
    mount_listing(&server, 2, &[]).await;
    mount_profile(
        &server,
        1,
        profile_page("Tel Link", r#"<a href="tel:05321112233">Ara</a>"#),
    )
    .await;
    mount_profile(
        &server,
        2,
        profile_page("Raw Text", "<span>GSM:&nbsp;+90 544 555 66 77</span>"),
    )
    .await;

    let config = template_config(&server, 2);
    let dir = TempDir::new().unwrap();
    let summary = crawl(&config, &dir, &MemoryEventSink::new()).await;

    let rows = read_rows(&summary);
    assert_eq!(rows[0][1], "Raw Text");
    assert_eq!(rows[0][3], "05445556677");
    assert_eq!(rows[1][1], "Tel Link");
    assert_eq!(rows[1][3], "05321112233");
}

#[tokio::test]
async fn test_card_name_used_when_profile_has_none() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, &[7]).await;
    mount_listing(&server, 2, &[]).await;
    mount_profile(
        &server,
        7,
        "<html><body><p>Profil hazırlanıyor</p></body></html>".to_string(),
    )
    .await;

    let config = template_config(&server, 1);
    let dir = TempDir::new().unwrap();
    let summary = crawl(&config, &dir, &MemoryEventSink::new()).await;

    let rows = read_rows(&summary);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "Card 7");
    assert_eq!(rows[0][2], "");
}

#[tokio::test]
async fn test_listing_failure_writes_partial_output() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, &[1, 2, 3]).await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    for id in 1..=3 {
        mount_profile(&server, id, profile_page(&format!("Agent {}", id), "")).await;
    }

    let config = template_config(&server, 3);
    let dir = TempDir::new().unwrap();
    let summary = crawl(&config, &dir, &MemoryEventSink::new()).await;

    assert!(summary.is_partial());
    assert!(summary.discovery_error.as_deref().unwrap().contains("502"));
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.count, 3);
    assert!(summary.output.as_ref().unwrap().exists());
}

#[tokio::test]
async fn test_non_ascii_names_round_trip_through_csv() {
    let names = [
        "Çağla Şenyüz",
        "Ömer Faruk Güllü",
        "İlknur \"İlk\" Işıkçı, MBA",
        "Ay\u{00A0}Nur  Kaya",
    ];

    let server = MockServer::start().await;
    mount_listing(&server, 1, &[1, 2, 3, 4]).await;
    mount_listing(&server, 2, &[]).await;
    for (index, name) in names.iter().enumerate() {
        let html = profile_page(&name.replace('"', "&quot;"), "");
        mount_profile(&server, index as u32 + 1, html).await;
    }

    let config = template_config(&server, 4);
    let dir = TempDir::new().unwrap();
    let summary = crawl(&config, &dir, &MemoryEventSink::new()).await;

    let rows = read_rows(&summary);
    let mut written: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    written.sort_unstable();
    let mut expected = names.to_vec();
    expected.sort_unstable();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_cancelled_run_still_writes_output() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, &[1]).await;

    let config = template_config(&server, 1);
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = run_crawl(
        &config.sites[0],
        &config.http,
        &CsvSink::new(dir.path(), false),
        &MemoryEventSink::new(),
        &cancel,
    )
    .await
    .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.count, 0);
    assert!(summary.output.as_ref().unwrap().exists());
}

/// Serves a fixed sequence of rendered listing pages
struct PagedDriver {
    pages: Vec<Vec<String>>,
    current: usize,
}

#[async_trait]
impl ListingDriver for PagedDriver {
    type Handle = usize;

    async fn navigate(&mut self, _url: &str) -> Result<(), SweepError> {
        Ok(())
    }

    async fn first_element(&mut self, _selector: &str) -> Result<Option<usize>, SweepError> {
        Ok(Some(self.current))
    }

    async fn extract_links(&mut self, _selector: &str) -> Result<Vec<String>, SweepError> {
        Ok(self.pages[self.current].clone())
    }

    async fn click_next(&mut self, _selector: &str) -> Result<bool, SweepError> {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn is_stale(&mut self, handle: &usize) -> Result<bool, SweepError> {
        Ok(*handle != self.current)
    }

    async fn close(&mut self) -> Result<(), SweepError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_interactive_site_end_to_end() {
    let server = MockServer::start().await;
    for id in 1..=3 {
        mount_profile(&server, id, profile_page(&format!("Danışman {}", id), "")).await;
    }

    let toml = format!(
        r#"
[http]
detail-timeout-secs = 5

[[site]]
name = "clicky"
base-url = "{uri}"
workers = 2

[site.discovery]
strategy = "interactive"
entry-url = "{uri}/Danismanlar.aspx"
listing-marker = "img.agent"
link-selectors = ["a:has(img.agent)"]
next-selector = "a.next"
wait-timeout-secs = 2
advance-timeout-secs = 2

[site.detail-fields]
name = [{{ selector = "h1.name" }}]
"#,
        uri = server.uri()
    );
    let config = parse_config(&toml).unwrap();
    let site = &config.sites[0];

    let driver = PagedDriver {
        pages: vec![
            vec!["/agent/2".to_string(), "/agent/1".to_string()],
            vec!["/agent/3".to_string(), "/agent/2".to_string()],
        ],
        current: 0,
    };

    let dir = TempDir::new().unwrap();
    let summary = Coordinator::new(site, &config.http)
        .unwrap()
        .run_with_driver(
            driver,
            &CsvSink::new(dir.path(), false),
            &MemoryEventSink::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.links_discovered, 3);
    assert_eq!(summary.count, 3);

    let rows = read_rows(&summary);
    let pages_and_names: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r[0].as_str(), r[1].as_str()))
        .collect();
    assert_eq!(
        pages_and_names,
        vec![("1", "Danışman 1"), ("1", "Danışman 2"), ("2", "Danışman 3")]
    );
}
