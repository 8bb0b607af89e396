//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, extract and archive cycle end-to-end.

use seedcrawl::config::{Config, CrawlerConfig, OutputConfig, SiteEntry, UserAgentConfig};
use seedcrawl::crawler::{HttpTransport, Orchestrator};
use seedcrawl::extract::ExtractorKind;
use seedcrawl::output::{load_statistics, RunReport};
use seedcrawl::state::UrlState;
use seedcrawl::storage::{ArchiveStorage, RunStatus};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for one site served by the mock server
fn create_test_config(server: &MockServer, extractor: ExtractorKind, seeds: &[&str], dir: &Path) -> Config {
    let host = url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        crawler: CrawlerConfig {
            max_pages: 10,
            extraction_quota: 10,
            minimum_delay_ms: 0,
            fetch_timeout_secs: 5,
            robots_timeout_secs: 5,
            max_crawl_delay_secs: 60,
            robots_fallback: Default::default(),
            max_concurrent_origins: 1,
            ignored_paths: Vec::new(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            data_dir: dir.join("data").to_string_lossy().into_owned(),
            database_path: dir.join("seedcrawl.db").to_string_lossy().into_owned(),
        },
        sites: vec![SiteEntry {
            domain: host,
            extractor,
            seeds: seeds
                .iter()
                .map(|seed| format!("{}{}", server.uri(), seed))
                .collect(),
        }],
    }
}

fn open_storage(config: &Config) -> ArchiveStorage {
    ArchiveStorage::open(
        Path::new(&config.output.data_dir),
        Path::new(&config.output.database_path),
    )
    .expect("Failed to open archive")
}

async fn crawl(config: &Config) -> RunReport {
    let transport = HttpTransport::new(&config.user_agent, &config.crawler).unwrap();
    let mut orchestrator =
        Orchestrator::new(config, Arc::new(transport), open_storage(config)).unwrap();
    orchestrator.run("test-hash").await.unwrap()
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
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

fn article(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#" <a href="{}">link</a>"#, href))
        .collect();
    format!(
        r#"<html lang="pl"><head><title>{title}</title></head><body>
        <div id="mw-content-text">
          <p>{title} to postać z mitologii greckiej.{anchors}</p>
          <h2>Przypisy</h2><p>Przypis do pominięcia.</p>
        </div>
        </body></html>"#
    )
}

fn file_names(config: &Config) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(&config.output.data_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_crawl_library_catalog() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_html(
        &server,
        "/katalog/",
        r#"<html><body>
            <a href="/katalog/lektura/dziady/">Dziady</a>
            <a href="/katalog/lektura/pan-tadeusz/">Pan Tadeusz</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    for slug in ["dziady", "pan-tadeusz"] {
        mount_html(
            &server,
            &format!("/katalog/lektura/{}/", slug),
            format!(
                r#"<html><body>
                <a class="l-button l-button--media l-button--media--full" href="/katalog/lektura/{}/">Czytaj online</a>
                </body></html>"#,
                slug
            ),
        )
        .await;
        mount_html(
            &server,
            &format!("/katalog/lektura/{}.html", slug),
            format!(
                r#"<html lang="pl"><head><title>{slug}</title></head><body>
                <h1 class="chapter-title">{slug}</h1>
                <div id="book-text"><div id="wltoc">Spis</div><p>Tekst utworu {slug}.</p></div>
                </body></html>"#
            ),
        )
        .await;
    }

    let config = create_test_config(&server, ExtractorKind::Library, &["/katalog/"], dir.path());
    let report = crawl(&config).await;

    assert_eq!(report.visited, 5);
    assert_eq!(report.links_pages, 3);
    assert_eq!(report.saved, 2);
    assert_eq!(report.links_accepted, 4);
    assert_eq!(
        file_names(&config),
        vec!["lektura-dziady.txt", "lektura-pan-tadeusz.txt"]
    );

    let content = std::fs::read_to_string(Path::new(&config.output.data_dir).join("lektura-dziady.txt")).unwrap();
    assert!(content.contains("Title: dziady\n"));
    assert!(content.contains("Content-Type: reading\n"));
    assert!(content.ends_with("\n\nTekst utworu dziady."));

    let stats = load_statistics(&open_storage(&config)).unwrap();
    let run = stats.run.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.saved, 2);
    assert_eq!(stats.visits_by_state.get(&UrlState::DocumentSaved), Some(&2));
    assert_eq!(stats.total_links, 4);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow: /wiki/Tajne\n").await;
    mount_html(&server, "/wiki/Zeus", article("Zeus", &["/wiki/Tajne", "/wiki/Hera"])).await;
    mount_html(&server, "/wiki/Hera", article("Hera", &[])).await;
    Mock::given(method("GET"))
        .and(path("/wiki/Tajne"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article("Tajne", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, ExtractorKind::Encyclopedia, &["/wiki/Zeus"], dir.path());
    let report = crawl(&config).await;

    assert_eq!(report.denied, 1);
    assert_eq!(report.saved, 2);
    assert_eq!(file_names(&config), vec!["wiki-Hera.txt", "wiki-Zeus.txt"]);

    let zeus = std::fs::read_to_string(Path::new(&config.output.data_dir).join("wiki-Zeus.txt")).unwrap();
    assert!(!zeus.contains("Przypis do pominięcia"));
}

#[tokio::test]
async fn test_unavailable_robots_denies_host() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Zeus"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article("Zeus", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, ExtractorKind::Encyclopedia, &["/wiki/Zeus"], dir.path());
    let report = crawl(&config).await;

    assert_eq!(report.denied, 1);
    assert_eq!(report.saved, 0);
}

#[tokio::test]
async fn test_extraction_quota_bounds_fan_out() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_html(
        &server,
        "/wiki/Zeus",
        article("Zeus", &["/wiki/Hera", "/wiki/Ares", "/wiki/Atena"]),
    )
    .await;
    mount_html(&server, "/wiki/Hera", article("Hera", &[])).await;
    for rejected in ["/wiki/Ares", "/wiki/Atena"] {
        Mock::given(method("GET"))
            .and(path(rejected))
            .respond_with(ResponseTemplate::new(200).set_body_string(article("X", &[])))
            .expect(0)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server, ExtractorKind::Encyclopedia, &["/wiki/Zeus"], dir.path());
    config.crawler.extraction_quota = 1;
    let report = crawl(&config).await;

    assert_eq!(report.links_accepted, 1);
    assert_eq!(report.links_rejected, 2);
    assert_eq!(report.saved, 2);
}

#[tokio::test]
async fn test_second_run_skips_archived_documents() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_html(&server, "/wiki/Zeus", article("Zeus", &["/wiki/Hera"])).await;
    mount_html(&server, "/wiki/Hera", article("Hera", &[])).await;

    let config = create_test_config(&server, ExtractorKind::Encyclopedia, &["/wiki/Zeus"], dir.path());

    let first = crawl(&config).await;
    assert_eq!(first.saved, 2);

    let second = crawl(&config).await;
    assert_eq!(second.saved, 0);
    assert_eq!(second.already_saved, 2);
    assert_eq!(second.links_accepted, 1);
    assert_eq!(file_names(&config).len(), 2);
}

#[tokio::test]
async fn test_page_budget_limits_saved_documents() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_html(&server, "/wiki/Zeus", article("Zeus", &["/wiki/Hera", "/wiki/Ares"])).await;
    mount_html(&server, "/wiki/Hera", article("Hera", &[])).await;
    mount_html(&server, "/wiki/Ares", article("Ares", &[])).await;

    let mut config = create_test_config(&server, ExtractorKind::Encyclopedia, &["/wiki/Zeus"], dir.path());
    config.crawler.max_pages = 1;
    let report = crawl(&config).await;

    assert_eq!(report.saved, 1);
    assert!(report.budget_reached);
    assert_eq!(file_names(&config), vec!["wiki-Zeus.txt"]);
}
