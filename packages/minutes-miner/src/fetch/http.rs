//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::header::{LOCATION, SET_COOKIE};

use crate::error::{MinerError, TransportError, TransportResult};
use crate::traits::transport::{FetchRequest, FetchResponse, Transport};

/// Production transport. Holds no cookie store and follows no
/// redirects; the fetch engine handles both so cookies set on a
/// redirect hop stay in its session.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport whose client returns redirects as-is.
    pub fn new() -> Result<Self, MinerError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| MinerError::Client(Box::new(e)))?;
        Ok(Self { client })
    }

    /// Use a custom HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn map_error(url: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&request.url, e))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&request.url, e))?;

        Ok(FetchResponse {
            status,
            set_cookies,
            location,
            body,
        })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
