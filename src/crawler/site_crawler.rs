//! Sequential crawl of a single documentation site

use chrono::Utc;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use url::Url;

use crate::crawler::content_extraction::{extract_links, extract_page};
use crate::crawler::error::CrawlError;
use crate::crawler::fetch::PageFetcher;
use crate::crawler::{truncate_chars, ContentSet, CrawlOutcome, CrawlerConfig, PageRecord};

/// Result of one crawl cycle, with the outcome of every candidate URL
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Outcomes in fetch order
    pub outcomes: Vec<CrawlOutcome>,
}

impl CrawlReport {
    /// Number of pages kept
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    /// URLs whose fetch failed
    pub fn failed_urls(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CrawlOutcome::Failed(_)))
            .map(|o| o.record().url.as_str())
            .collect()
    }

    /// URLs dropped for having too little content
    pub fn too_short_urls(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CrawlOutcome::TooShort(_)))
            .map(|o| o.record().url.as_str())
            .collect()
    }

    /// The accepted pages as a content set
    pub fn into_content_set(self) -> ContentSet {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                CrawlOutcome::Accepted(record) => Some(record),
                _ => None,
            })
            .collect()
    }
}

/// Crawler for one documentation site
#[derive(Debug, Clone)]
pub struct SiteCrawler {
    config: CrawlerConfig,
    fetcher: PageFetcher,
}

impl SiteCrawler {
    /// Create a crawler with the given configuration
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = PageFetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    /// The crawler configuration
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Candidate URLs: the base URL followed by the known paths resolved against it
    ///
    /// Duplicates (by exact string after resolution) are dropped and the list
    /// is capped at `max_pages`.
    pub fn candidate_urls(&self) -> Result<Vec<String>, CrawlError> {
        let base = Url::parse(&self.config.base_url)?;
        let mut urls = vec![base.to_string()];

        for path in &self.config.known_paths {
            match base.join(path) {
                Ok(resolved) => {
                    let resolved = resolved.to_string();
                    if !urls.contains(&resolved) {
                        urls.push(resolved);
                    }
                }
                Err(e) => warn!("Skipping path '{}': {}", path, e),
            }
        }

        urls.truncate(self.config.max_pages.max(1));
        Ok(urls)
    }

    /// Fetch and extract a single page
    ///
    /// Failures come back as a record with `error` set and a description of
    /// the failure as its content.
    pub async fn crawl_one(&self, url: &str) -> PageRecord {
        self.fetch_page(url).await.0
    }

    /// Crawl every candidate URL and keep the substantial pages
    pub async fn crawl_all(&self) -> ContentSet {
        self.crawl_report().await.into_content_set()
    }

    /// Crawl every candidate URL, reporting what happened to each
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn crawl_report(&self) -> CrawlReport {
        info!("Starting crawl for {}", self.config.base_url);
        debug!("Crawler config: {:?}", self.config);

        let mut candidates = match self.candidate_urls() {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Invalid base URL {}: {}", self.config.base_url, e);
                return CrawlReport::default();
            }
        };

        let mut report = CrawlReport::default();
        let mut index = 0;
        while index < candidates.len() {
            if index > 0 && self.config.request_delay_ms > 0 {
                tokio::time::sleep(self.config.request_delay()).await;
            }

            let url = candidates[index].clone();
            let (record, html) = self.fetch_page(&url).await;

            if index == 0 && self.config.discover_links {
                if let Some(html) = html.as_deref() {
                    self.add_discovered_links(html, &mut candidates);
                }
            }

            let outcome = CrawlOutcome::classify(record, self.config.min_content_length);
            match &outcome {
                CrawlOutcome::Accepted(_) => {}
                CrawlOutcome::Failed(record) => {
                    warn!("Skipping {}: {}", record.url, record.content)
                }
                CrawlOutcome::TooShort(record) => debug!(
                    "Skipping {}: {} characters is below the minimum of {}",
                    record.url,
                    record.content_chars(),
                    self.config.min_content_length
                ),
            }
            report.outcomes.push(outcome);
            index += 1;
        }

        info!(
            "Crawl finished: {} of {} pages kept",
            report.accepted(),
            report.outcomes.len()
        );
        report
    }

    async fn fetch_page(&self, url: &str) -> (PageRecord, Option<String>) {
        let span = info_span!("fetch_page", url = %url);
        async {
            match self.fetcher.fetch(url).await {
                Ok(html) => {
                    let extracted = extract_page(&html, url, &self.config);
                    let content = truncate_chars(&extracted.content, self.config.max_content_length);
                    let record = PageRecord {
                        url: url.to_string(),
                        title: extracted.title,
                        content,
                        fetched_at: Utc::now(),
                        error: false,
                    };
                    (record, Some(html))
                }
                Err(e) => (PageRecord::failed(url, &e), None),
            }
        }
        .instrument(span)
        .await
    }

    fn add_discovered_links(&self, html: &str, candidates: &mut Vec<String>) {
        let Ok(base) = Url::parse(&self.config.base_url) else {
            return;
        };

        let mut added = 0;
        for link in extract_links(html, &base) {
            if candidates.len() >= self.config.max_pages {
                break;
            }
            if !candidates.contains(&link) {
                candidates.push(link);
                added += 1;
            }
        }
        debug!("Discovered {} additional links on {}", added, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::TRUNCATION_MARKER;
    use mockito::Server;

    const LONG_PAGE: &str = "<html><head><title>Data Access</title></head><body><main>\
        To access the data, apply via the portal and wait for approval.</main></body></html>";

    fn config_for(server: &Server) -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url(format!("{}/docs/", server.url()))
            .request_delay_ms(0)
            .min_content_length(20)
            .build()
    }

    #[test]
    fn test_candidate_urls_resolve_and_dedup() {
        let config = CrawlerConfig::builder()
            .base_url("https://example.com/docs/")
            .known_paths(vec![
                "access/".to_string(),
                "/docs/access/".to_string(),
                "team".to_string(),
                "https://example.com/docs/".to_string(),
            ])
            .build();
        let crawler = SiteCrawler::new(config).unwrap();

        assert_eq!(
            crawler.candidate_urls().unwrap(),
            vec![
                "https://example.com/docs/".to_string(),
                "https://example.com/docs/access/".to_string(),
                "https://example.com/docs/team".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidate_urls_invalid_base() {
        let config = CrawlerConfig::builder().base_url("not a url").build();
        let crawler = SiteCrawler::new(config).unwrap();
        assert!(matches!(
            crawler.candidate_urls(),
            Err(CrawlError::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn test_crawl_isolates_failures() {
        let mut server = Server::new_async().await;
        let base = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(LONG_PAGE)
            .expect(1)
            .create_async()
            .await;
        let access = server
            .mock("GET", "/docs/access/")
            .with_status(200)
            .with_body(LONG_PAGE)
            .expect(1)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/docs/missing")
            .with_status(500)
            .create_async()
            .await;
        let _short = server
            .mock("GET", "/docs/short")
            .with_status(200)
            .with_body("<html><body><main>Tiny</main></body></html>")
            .create_async()
            .await;

        let mut config = config_for(&server);
        config.known_paths = vec![
            "missing".to_string(),
            "access/".to_string(),
            "short".to_string(),
            "access/".to_string(),
        ];
        let crawler = SiteCrawler::new(config).unwrap();

        let report = crawler.crawl_report().await;
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.accepted(), 2);
        assert_eq!(
            report.failed_urls(),
            vec![format!("{}/docs/missing", server.url()).as_str()]
        );
        assert_eq!(
            report.too_short_urls(),
            vec![format!("{}/docs/short", server.url()).as_str()]
        );

        let content = report.into_content_set();
        assert_eq!(content.len(), 2);
        let page = content
            .get(&format!("{}/docs/access/", server.url()))
            .unwrap();
        assert_eq!(page.title, "Data Access");
        assert!(!page.error);

        base.assert_async().await;
        access.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_one_reports_failure_as_record() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/docs/gone")
            .with_status(404)
            .create_async()
            .await;

        let crawler = SiteCrawler::new(config_for(&server)).unwrap();
        let record = crawler
            .crawl_one(&format!("{}/docs/gone", server.url()))
            .await;

        assert!(record.error);
        assert!(record.content.contains("404"));
    }

    #[tokio::test]
    async fn test_long_content_is_truncated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(LONG_PAGE)
            .create_async()
            .await;

        let mut config = config_for(&server);
        config.max_content_length = 25;
        let crawler = SiteCrawler::new(config).unwrap();

        let record = crawler.crawl_one(&format!("{}/docs/", server.url())).await;
        assert_eq!(
            record.content,
            format!("To access the data, apply{}", TRUNCATION_MARKER)
        );
    }

    #[tokio::test]
    async fn test_link_discovery_is_bounded() {
        let mut server = Server::new_async().await;
        let index = "<html><body><main>Welcome to the documentation index page.\
             <a href=\"guide\">Guide</a><a href=\"/docs/faq\">FAQ</a>\
             <a href=\"/elsewhere\">Out of scope</a></main></body></html>";
        let _base = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(index)
            .create_async()
            .await;
        let guide = server
            .mock("GET", "/docs/guide")
            .with_status(200)
            .with_body(LONG_PAGE)
            .expect(1)
            .create_async()
            .await;
        let faq = server
            .mock("GET", "/docs/faq")
            .with_status(200)
            .with_body(LONG_PAGE)
            .expect(0)
            .create_async()
            .await;

        let mut config = config_for(&server);
        config.discover_links = true;
        config.max_pages = 2;
        let crawler = SiteCrawler::new(config).unwrap();

        let content = crawler.crawl_all().await;
        assert_eq!(content.len(), 2);
        assert!(content.get(&format!("{}/docs/guide", server.url())).is_some());

        guide.assert_async().await;
        faq.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_site_yields_empty_set() {
        let config = CrawlerConfig::builder()
            .base_url("http://127.0.0.1:9/docs/")
            .request_delay_ms(0)
            .request_timeout_secs(2)
            .build();
        let crawler = SiteCrawler::new(config).unwrap();

        let report = crawler.crawl_report().await;
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.failed_urls().len(), 1);
        assert!(report.into_content_set().is_empty());
    }

    #[tokio::test]
    async fn test_latin1_page_keeps_accents() {
        let mut server = Server::new_async().await;
        let mut body = b"<html><head><title>Caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(b"</title></head><body><main>Le caf");
        body.push(0xE9);
        body.extend_from_slice(b" est ouvert pour les donn");
        body.push(0xE9);
        body.extend_from_slice(b"es.</main></body></html>");
        let _page = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=iso-8859-1")
            .with_body(body)
            .create_async()
            .await;

        let crawler = SiteCrawler::new(config_for(&server)).unwrap();
        let record = crawler.crawl_one(&format!("{}/docs/", server.url())).await;

        assert!(!record.error);
        assert_eq!(record.title, "Café");
        assert_eq!(record.content, "Le café est ouvert pour les données.");
    }

    #[tokio::test]
    async fn test_delay_between_consecutive_fetches() {
        let mut server = Server::new_async().await;
        let pages = server
            .mock("GET", mockito::Matcher::Regex(r"^/docs/.*$".to_string()))
            .with_status(200)
            .with_body(LONG_PAGE)
            .expect(3)
            .create_async()
            .await;

        let config = CrawlerConfig::builder()
            .base_url(format!("{}/docs/", server.url()))
            .known_paths(vec!["a".to_string(), "b".to_string()])
            .request_delay_ms(200)
            .min_content_length(20)
            .build();
        let crawler = SiteCrawler::new(config).unwrap();

        let started = std::time::Instant::now();
        let report = crawler.crawl_report().await;
        let elapsed = started.elapsed();

        assert_eq!(report.accepted(), 3);
        assert!(elapsed >= std::time::Duration::from_millis(400), "{:?}", elapsed);
        pages.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_delay_before_first_fetch() {
        let mut server = Server::new_async().await;
        let _page = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(LONG_PAGE)
            .create_async()
            .await;

        let config = CrawlerConfig::builder()
            .base_url(format!("{}/docs/", server.url()))
            .request_delay_ms(200)
            .min_content_length(20)
            .build();
        let crawler = SiteCrawler::new(config).unwrap();

        let started = std::time::Instant::now();
        let report = crawler.crawl_report().await;
        let elapsed = started.elapsed();

        assert_eq!(report.accepted(), 1);
        assert!(elapsed < std::time::Duration::from_millis(200), "{:?}", elapsed);
    }
}
