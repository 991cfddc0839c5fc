//! Cache-or-crawl access to the content set

use tracing::{info, instrument, warn};

use crate::crawler::{
    CacheConfig, ContentCache, ContentSet, CrawlError, CrawlReport, CrawlerConfig, SiteCrawler,
};

/// The content set of one site, served from the cache while it is fresh
#[derive(Debug, Clone)]
pub struct ContentSource {
    crawler: SiteCrawler,
    cache: ContentCache,
}

impl ContentSource {
    /// Create a source for the site named in the crawler config
    pub fn new(crawler: CrawlerConfig, cache: CacheConfig) -> Result<Self, CrawlError> {
        let cache = ContentCache::new(cache, crawler.base_url.clone());
        let crawler = SiteCrawler::new(crawler)?;
        Ok(Self { crawler, cache })
    }

    /// The crawler
    pub fn crawler(&self) -> &SiteCrawler {
        &self.crawler
    }

    /// The content cache
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Content set from the cache if fresh, otherwise crawled and re-cached
    #[instrument(skip(self))]
    pub async fn load(&self) -> ContentSet {
        if let Some(content) = self.cache.load().await {
            return content;
        }

        info!("Cache miss, crawling {}", self.crawler.config().base_url);
        let content = self.crawler.crawl_all().await;
        self.store(&content).await;
        content
    }

    /// Discard the cache and crawl again
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> CrawlReport {
        if let Err(e) = self.cache.invalidate().await {
            warn!("Failed to invalidate cache: {}", e);
        }

        let report = self.crawler.crawl_report().await;
        let content = report.clone().into_content_set();
        self.store(&content).await;
        report
    }

    async fn store(&self, content: &ContentSet) {
        if content.is_empty() {
            warn!("Crawl produced no pages; not caching an empty result");
            return;
        }
        if let Err(e) = self.cache.save(content).await {
            warn!("Failed to save cache, continuing with crawled content: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    const PAGE: &str = "<html><head><title>Home</title></head><body><main>\
        Welcome to the documentation for the data service.</main></body></html>";

    fn source(base_url: String, dir: &TempDir) -> ContentSource {
        ContentSource::new(
            CrawlerConfig::builder()
                .base_url(base_url)
                .request_delay_ms(0)
                .min_content_length(20)
                .build(),
            CacheConfig {
                path: dir.path().join("cache.json"),
                ttl_secs: 3600,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let mut server = Server::new_async().await;
        let home = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(PAGE)
            .expect(1)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let source = source(format!("{}/docs/", server.url()), &dir);

        let first = source.load().await;
        let second = source.load().await;

        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        home.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_recrawls() {
        let mut server = Server::new_async().await;
        let home = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_body(PAGE)
            .expect(2)
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();
        let source = source(format!("{}/docs/", server.url()), &dir);

        assert_eq!(source.load().await.len(), 1);
        let report = source.refresh().await;
        assert_eq!(report.accepted(), 1);
        assert_eq!(source.load().await.len(), 1);

        home.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_crawl_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let source = source("http://127.0.0.1:9/docs/".to_string(), &dir);

        assert!(source.load().await.is_empty());
        assert!(source.cache().read_entry().await.unwrap().is_none());
    }
}
