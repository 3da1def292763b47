use core::time::Duration;

use crate::{AllocatorTransport, Error, FetchResponse, Result, blocks_url};

/// Timeout applied to every allocator request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`AllocatorTransport`] issuing HTTP `GET` requests with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a [`REQUEST_TIMEOUT`] timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Transport {
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client.
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AllocatorTransport for HttpTransport {
    async fn request_blocks(&self, server: &str, blocks: usize) -> Result<FetchResponse> {
        let response = self
            .client
            .get(blocks_url(server, blocks))
            .send()
            .await
            .map_err(|e| Error::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(|e| Error::Transport {
            reason: format!("failed to read response body: {e}"),
        })?;

        Ok(FetchResponse {
            status,
            retry_after,
            body,
        })
    }
}
