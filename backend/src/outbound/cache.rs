//! Remote image fetching with an in-memory TTL cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::domain::ports::{FetchedImage, ImageFetchError, ImageSource};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// Some image CDNs refuse requests without a browser user-agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Reqwest-backed image origin adapter.
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    /// Build an adapter with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageFetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ImageFetchError::Timeout { url: url.into() }
            } else {
                ImageFetchError::Fetch {
                    message: e.to_string(),
                }
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Fetch {
                message: format!("origin returned {status}"),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_owned();
        let bytes = response.bytes().await.map_err(|e| ImageFetchError::Fetch {
            message: e.to_string(),
        })?;
        Ok(FetchedImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// TTL cache in front of an [`ImageSource`].
///
/// Expired entries are replaced on the next fetch; a failed refresh never
/// evicts a still-valid entry because expiry is checked before the fetch.
pub struct ImageCache {
    source: Box<dyn ImageSource>,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, FetchedImage)>>,
}

impl ImageCache {
    pub fn new(source: Box<dyn ImageSource>) -> Self {
        Self::with_ttl(source, CACHE_TTL)
    }

    pub fn with_ttl(source: Box<dyn ImageSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached image for `url`, fetching through on miss or expiry.
    pub async fn get_or_fetch(&self, url: &str) -> Result<FetchedImage, ImageFetchError> {
        if let Some(image) = self.cached(url) {
            return Ok(image);
        }
        let image = self.source.fetch(url).await?;
        self.store(url, image.clone());
        Ok(image)
    }

    fn cached(&self, url: &str) -> Option<FetchedImage> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("image cache mutex poisoned; continuing with recovered state");
                poisoned.into_inner()
            }
        };
        entries
            .get(url)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, image)| image.clone())
    }

    fn store(&self, url: &str, image: FetchedImage) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(url.to_owned(), (Instant::now(), image));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedImage {
                content_type: "image/png".into(),
                bytes: url.as_bytes().to_vec(),
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ImageSource for FailingSource {
        async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageFetchError> {
            Err(ImageFetchError::Timeout { url: url.into() })
        }
    }

    #[tokio::test]
    async fn repeat_fetches_hit_the_cache() {
        let cache = ImageCache::new(Box::new(CountingSource {
            calls: AtomicUsize::new(0),
        }));
        let first = cache.get_or_fetch("https://x.org/a.png").await.expect("fetch");
        let second = cache.get_or_fetch("https://x.org/a.png").await.expect("cached");
        assert_eq!(first, second);

        // Distinct URLs are distinct entries.
        cache.get_or_fetch("https://x.org/b.png").await.expect("fetch");
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let source = Box::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let cache = ImageCache::with_ttl(source, Duration::ZERO);
        cache.get_or_fetch("https://x.org/a.png").await.expect("fetch");
        cache.get_or_fetch("https://x.org/a.png").await.expect("refetch");
    }

    #[tokio::test]
    async fn source_failures_propagate() {
        let cache = ImageCache::new(Box::new(FailingSource));
        let err = cache
            .get_or_fetch("https://x.org/a.png")
            .await
            .expect_err("timeout");
        assert!(matches!(err, ImageFetchError::Timeout { .. }));
    }
}
