//! HTTP transport seam.
//!
//! The resolver only ever talks to an [`HttpFetcher`], so tests drive it
//! with an in-memory fake and embedders can swap transports. The shipped
//! implementation wraps a shared `reqwest` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use mvn2get_util::errors::Mvn2getError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Status and body of a completed GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal blocking-friendly HTTP surface the core consumes.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch a URL. Transport failures are errors; HTTP error statuses are
    /// returned as responses.
    async fn get(&self, url: &str) -> miette::Result<HttpResponse>;

    /// Probe a URL, returning only the status code.
    async fn head(&self, url: &str) -> miette::Result<u16>;
}

/// Production fetcher over a shared `reqwest` client.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> miette::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("mvn2get/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Mvn2getError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> miette::Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Mvn2getError::Network {
                message: format!("GET {url} failed: {e}"),
            })?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Mvn2getError::Network {
                message: format!("Failed to read response from {url}: {e}"),
            })?
            .to_vec();
        Ok(HttpResponse { status, body })
    }

    async fn head(&self, url: &str) -> miette::Result<u16> {
        let resp = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| Mvn2getError::Network {
                message: format!("HEAD {url} failed: {e}"),
            })?;
        Ok(resp.status().as_u16())
    }
}

/// GET with 404 mapped to `None` and one retry on transport errors or 5xx.
///
/// Other non-success statuses are reported as network errors.
pub async fn fetch_optional(
    fetcher: &dyn HttpFetcher,
    url: &str,
) -> miette::Result<Option<Vec<u8>>> {
    let mut last_err: Option<miette::Report> = None;

    for attempt in 0..2 {
        if attempt > 0 {
            tracing::debug!("retrying {url}");
            tokio::time::sleep(RETRY_DELAY).await;
        }
        match fetcher.get(url).await {
            Ok(resp) if resp.status == 404 => return Ok(None),
            Ok(resp) if resp.is_success() => return Ok(Some(resp.body)),
            Ok(resp) if resp.status >= 500 => {
                last_err = Some(
                    Mvn2getError::Network {
                        message: format!("HTTP {} from {url}", resp.status),
                    }
                    .into(),
                );
            }
            Ok(resp) => {
                return Err(Mvn2getError::Network {
                    message: format!("HTTP {} fetching {url}", resp.status),
                }
                .into());
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        Mvn2getError::Network {
            message: format!("Failed to fetch {url}"),
        }
        .into()
    }))
}
