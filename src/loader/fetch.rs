use std::io::Read;
use std::time::Duration;

use url::Url;

use super::ResourceLoadError;

/// Upper bound on a fetched resource body.
pub const MAX_RESOURCE_BYTES: usize = 2 * 1024 * 1024;

/// Retrieves the bytes behind a resource location.
///
/// Called on a loader worker thread, never on the UI thread.
pub trait Fetcher: Send + Sync {
    /// # Errors
    /// Returns [`ResourceLoadError`] for network failures, non-200 responses
    /// and oversized bodies.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResourceLoadError>;
}

/// Blocking HTTP fetcher backed by a shared `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("markpad/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            max_bytes: MAX_RESOURCE_BYTES,
        }
    }

    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResourceLoadError> {
        let response = match self.agent.request_url("GET", url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(ResourceLoadError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Err(err) => {
                return Err(ResourceLoadError::Network {
                    url: url.to_string(),
                    reason: err.to_string(),
                });
            }
        };

        let status = response.status();
        if status != 200 {
            return Err(ResourceLoadError::Status {
                url: url.to_string(),
                status,
            });
        }

        let limit = u64::try_from(self.max_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut body = Vec::new();
        response
            .into_reader()
            .take(limit)
            .read_to_end(&mut body)
            .map_err(|err| ResourceLoadError::Network {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        if body.len() > self.max_bytes {
            return Err(ResourceLoadError::TooLarge {
                url: url.to_string(),
                limit: self.max_bytes,
            });
        }
        Ok(body)
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_host_is_network_error() {
        let fetcher = HttpFetcher::new(Duration::from_millis(200));
        let url = Url::parse("http://127.0.0.1:9/engine.json").unwrap();
        let err = fetcher.fetch(&url).unwrap_err();
        assert!(matches!(err, ResourceLoadError::Network { .. }), "{err}");
    }
}
