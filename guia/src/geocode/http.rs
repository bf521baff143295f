//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::error::GeocodeError;

/// Default User-Agent. Nominatim's usage policy rejects anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!("guia/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for asynchronous HTTP GET requests.
///
/// This abstraction allows the geocoding client to be exercised against mock
/// transports in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body for 2xx responses, `GeocodeError::Http` for any
    /// other status, and `GeocodeError::Network` for transport failures.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, GeocodeError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default User-Agent and timeout.
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_options(DEFAULT_USER_AGENT, DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a client with a custom User-Agent and timeout.
    pub fn with_options(user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| GeocodeError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, GeocodeError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(GeocodeError::Network(format!("Request failed: {}", e)));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(GeocodeError::Http {
                status_code: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| GeocodeError::Network(format!("Failed to read response: {}", e)))
    }
}
