//! Integration tests for the fetch-and-extract pipeline
//!
//! These tests use wiremock mock servers for the HTTP side and instrumented
//! stubs for concurrency and extraction behavior.

use async_trait::async_trait;
use paperbind::config::FetchConfig;
use paperbind::pipeline::{
    fetch_with_retry, ExtractedContent, Extractor, FetchError, FetchErrorKind, Fetcher,
    HttpFetcher, NullObserver, Outcome, ProgressObserver, ReadabilityExtractor, RetryPolicy,
    SkipReason,
};
use paperbind::{Entry, NormalizedArticle, Pipeline};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a page that readability will recognise as an article
fn article_page(heading: &str) -> String {
    let paragraph = "This paragraph is part of a long-form article, and it contains many words, \
        several commas, and complete sentences so that content scoring treats it as prose. \
        It keeps going for a while, describing nothing in particular, but at length.";
    format!(
        r#"<html><head><title>{heading} | Site Name</title></head>
        <body>
            <nav><a href="/">Home</a><a href="/about">About</a></nav>
            <article><h1>{heading}</h1><p>{p}</p><p>{p}</p><p>{p}</p></article>
            <footer>Footer text</footer>
        </body></html>"#,
        heading = heading,
        p = paragraph
    )
}

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        delay: Duration::from_millis(20),
        retry_permanent: true,
    }
}

fn settings(concurrency: usize, attempts: u32) -> paperbind::pipeline::PipelineSettings {
    paperbind::pipeline::PipelineSettings {
        concurrency,
        retry: fast_retry(attempts),
    }
}

/// Records every progress event
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<(usize, usize, Outcome)>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<(usize, usize, Outcome)> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.events().iter().filter(|(_, _, o)| predicate(o)).count()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, index: usize, total: usize, outcome: &Outcome) {
        self.events
            .lock()
            .unwrap()
            .push((index, total, outcome.clone()));
    }
}

/// Fetcher that tracks how many requests are in flight at once
struct InstrumentedFetcher {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl InstrumentedFetcher {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetcher for InstrumentedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(FetchError::new(FetchErrorKind::Network, "connection reset"));
        }
        Ok(url.as_bytes().to_vec())
    }
}

/// Extractor that wraps the fetched body, or finds nothing in "paywall" pages
struct StubExtractor;

impl Extractor for StubExtractor {
    fn extract(&self, html: &[u8], _url: &Url) -> Option<ExtractedContent> {
        let body = String::from_utf8_lossy(html);
        if body.contains("paywall") {
            return None;
        }
        Some(ExtractedContent {
            title: Some(format!("Extracted {}", body)),
            byline: None,
            content: format!("<p>{}</p>", body),
        })
    }
}

fn entries(count: usize) -> Vec<Entry> {
    (1..=count)
        .map(|i| Entry::new(format!("https://example.com/{}", i), format!("Entry {}", i)))
        .collect()
}

#[tokio::test]
async fn test_bounded_concurrency() {
    let fetcher = Arc::new(InstrumentedFetcher::new(Duration::from_millis(30)));
    let pipeline = Pipeline::new(
        fetcher.clone(),
        Arc::new(StubExtractor),
        Arc::new(NullObserver),
        settings(3, 1),
    );

    let report = pipeline.run(entries(12)).await;

    assert_eq!(report.succeeded(), 12);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 12);
    let max = fetcher.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "at most 3 fetches in flight, saw {}", max);
    assert!(max >= 1);
    assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fewer_entries_than_workers() {
    let fetcher = Arc::new(InstrumentedFetcher::new(Duration::from_millis(5)));
    let pipeline = Pipeline::new(
        fetcher.clone(),
        Arc::new(StubExtractor),
        Arc::new(NullObserver),
        settings(8, 1),
    );

    let report = pipeline.run(entries(2)).await;

    assert_eq!(report.succeeded(), 2);
    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_failure_isolation() {
    let mut input = entries(6);
    input[3].url = "https://example.com/broken".to_string();

    let observer = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::new(
        Arc::new(InstrumentedFetcher::new(Duration::from_millis(5))),
        Arc::new(StubExtractor),
        observer.clone(),
        settings(3, 2),
    );

    let report = pipeline.run(input).await;

    assert_eq!(report.total, 6);
    assert_eq!(report.succeeded(), 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].url, "https://example.com/broken");
    assert!(matches!(
        &report.skipped[0].reason,
        SkipReason::FetchFailed(msg) if msg.contains("Failed after 2 attempts")
    ));
    assert_eq!(
        observer.count(|o| matches!(o, Outcome::Retrying { attempt: 1, attempts: 2, .. })),
        1
    );
    assert!(report
        .articles
        .iter()
        .all(|a| a.url != "https://example.com/broken"));
}

#[tokio::test]
async fn test_extraction_none_is_skipped() {
    let mut input = entries(4);
    input[1].url = "https://example.com/paywall".to_string();

    let observer = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::new(
        Arc::new(InstrumentedFetcher::new(Duration::from_millis(1))),
        Arc::new(StubExtractor),
        observer.clone(),
        settings(2, 1),
    );

    let report = pipeline.run(input).await;

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::NoContent);
    assert_eq!(
        observer.count(|o| matches!(o, Outcome::NoContent { url } if url.ends_with("/paywall"))),
        1
    );
}

#[tokio::test]
async fn test_progress_indices_and_summary() {
    let observer = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::new(
        Arc::new(InstrumentedFetcher::new(Duration::from_millis(2))),
        Arc::new(StubExtractor),
        observer.clone(),
        settings(3, 1),
    );

    pipeline.run(entries(7)).await;

    let events = observer.events();
    let mut indices: Vec<usize> = events
        .iter()
        .filter(|(_, _, o)| matches!(o, Outcome::Fetching { .. }))
        .map(|(index, total, _)| {
            assert_eq!(*total, 7);
            *index
        })
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, (1..=7).collect::<Vec<_>>());

    let last = events.last().unwrap();
    assert_eq!(last.2, Outcome::Finished { succeeded: 7 });
}

#[tokio::test]
async fn test_runs_are_order_independent() {
    let pipeline = Pipeline::new(
        Arc::new(InstrumentedFetcher::new(Duration::from_millis(3))),
        Arc::new(StubExtractor),
        Arc::new(NullObserver),
        settings(4, 1),
    );

    let first: HashSet<NormalizedArticle> = pipeline.run(entries(9)).await.articles.into_iter().collect();
    let second: HashSet<NormalizedArticle> = pipeline.run(entries(9)).await.articles.into_iter().collect();

    assert_eq!(first.len(), 9);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_http_fetcher_sends_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let body = fetcher.fetch(&format!("{}/doc", server.uri())).await.unwrap();
    assert_eq!(body, b"<html>ok</html>");

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    let user_agent = headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(user_agent.contains("Mozilla/5.0"));
    assert!(headers.get("accept").unwrap().to_str().unwrap().contains("text/html"));
    assert!(headers.get("accept-language").is_some());
}

#[tokio::test]
async fn test_http_fetcher_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let err = fetcher
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::HttpStatus(404));
}

#[tokio::test]
async fn test_http_fetcher_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = FetchConfig {
        timeout_secs: 1,
        ..FetchConfig::default()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();
    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Timeout);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let mut retried = Vec::new();
    let body = fetch_with_retry(
        &fetcher,
        &format!("{}/flaky", server.uri()),
        &fast_retry(2),
        |attempt, err| retried.push((attempt, err.kind)),
    )
    .await
    .unwrap();

    assert_eq!(body, b"<html>ok</html>");
    assert_eq!(retried, vec![(1, FetchErrorKind::HttpStatus(500))]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retry_exhausts_attempt_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let failure = fetch_with_retry(
        &fetcher,
        &format!("{}/down", server.uri()),
        &fast_retry(3),
        |_, _| {},
    )
    .await
    .unwrap_err();

    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.last_error.kind, FetchErrorKind::HttpStatus(503));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_end_to_end_five_entries_two_failures() {
    let server = MockServer::start().await;
    for i in [1, 3, 5] {
        Mock::given(method("GET"))
            .and(path(format!("/article-{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(article_page(&format!("Messy <site> Title {}", i)), "text/html"),
            )
            .mount(&server)
            .await;
    }
    for i in [2, 4] {
        Mock::given(method("GET"))
            .and(path(format!("/article-{}", i)))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }

    let input: Vec<Entry> = (1..=5)
        .map(|i| {
            Entry::new(
                format!("{}/article-{}", server.uri(), i),
                format!("Clean Title {}", i),
            )
        })
        .collect();

    let observer = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::new(
        Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap()),
        Arc::new(ReadabilityExtractor),
        observer.clone(),
        settings(3, 2),
    );

    let report = pipeline.run(input).await;

    let mut titles: Vec<String> = report.articles.iter().map(|a| a.title.clone()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Clean Title 1", "Clean Title 3", "Clean Title 5"]);
    assert!(report
        .articles
        .iter()
        .all(|a| a.content.contains("long-form article") && !a.content.contains("<script")));

    assert_eq!(report.skipped.len(), 2);
    let mut skipped: Vec<&str> = report.skipped.iter().map(|s| s.url.as_str()).collect();
    skipped.sort();
    assert!(skipped[0].ends_with("/article-2"));
    assert!(skipped[1].ends_with("/article-4"));
    assert_eq!(observer.count(|o| matches!(o, Outcome::Skipped { .. })), 2);

    let articles = report.into_articles().unwrap();
    assert_eq!(articles.len(), 3);
}

#[tokio::test]
async fn test_all_failures_yield_batch_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let input: Vec<Entry> = (1..=3)
        .map(|i| Entry::new(format!("{}/gone-{}", server.uri(), i), format!("Gone {}", i)))
        .collect();

    let pipeline = Pipeline::new(
        Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap()),
        Arc::new(ReadabilityExtractor),
        Arc::new(NullObserver),
        settings(2, 1),
    );

    let report = pipeline.run(input).await;
    assert_eq!(report.skipped.len(), 3);
    assert!(matches!(
        report.into_articles(),
        Err(paperbind::PaperbindError::BatchEmpty { total: 3 })
    ));
}

#[tokio::test]
async fn test_csv_to_epub_with_blank_title_and_legacy_charset() {
    use paperbind::config::InputConfig;
    use paperbind::input::read_entries;
    use paperbind::output::{ArticleSink, BookMetadata, EpubWriter};
    use std::io::Read;

    let server = MockServer::start().await;
    let page = article_page("\u{10c}itanje za vikend")
        .replace("<head>", r#"<head><meta charset="windows-1250">"#);
    let (bytes, _, _) = encoding_rs::WINDOWS_1250.encode(&page);
    Mock::given(method("GET"))
        .and(path("/vikend"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "text/html"))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("export.csv");
    std::fs::write(
        &csv_path,
        format!(
            "URL,Title,Selection,Folder,Timestamp\n{}/vikend,,,Unread,1700000000\n",
            server.uri()
        ),
    )
    .unwrap();

    let batch = read_entries(&csv_path, &InputConfig::default()).unwrap();
    assert_eq!(batch.entries[0].title, "");

    let pipeline = Pipeline::new(
        Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap()),
        Arc::new(ReadabilityExtractor),
        Arc::new(NullObserver),
        settings(2, 1),
    );
    let articles = pipeline.run(batch.entries).await.into_articles().unwrap();
    assert!(articles[0].title.contains("\u{10c}itanje za vikend"));

    let writer = EpubWriter::new(
        dir.path().join("out"),
        "reads",
        BookMetadata {
            title: "Reading list".to_string(),
            author: "Paperbind".to_string(),
            language: "hr".to_string(),
            date: "2024-05-01".to_string(),
        },
    );
    let written = writer.write(&articles).unwrap();

    let file = std::fs::File::open(&written.paths[0]).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let chapter_name = archive
        .file_names()
        .find(|n| n.ends_with("article_1.xhtml"))
        .map(String::from)
        .unwrap();
    let mut chapter = String::new();
    archive
        .by_name(&chapter_name)
        .unwrap()
        .read_to_string(&mut chapter)
        .unwrap();
    assert!(chapter.contains("<h1>\u{10c}itanje za vikend"));
    assert!(chapter.contains("long-form article"));
}
