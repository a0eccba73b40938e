//! Upstream REST API client.
//!
//! [`RemoteApi`] is the seam between the resolver/fetcher and the network:
//! one authenticated GET per call, no retries, status codes mapped to
//! [`ApiStatus`]. [`HttpApiClient`] is the `reqwest` implementation used in
//! production.

use std::time::Duration;

use reqwest::header::{HeaderValue, LINK};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::ApiError;
use crate::link;

/// Header the upstream reads the personal access token from.
pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Default upstream API base URL.
pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";

/// Default deadline for a single upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Typed outcome of an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    /// Any 2xx response.
    Ok,
    /// 404.
    NotFound,
    /// 401.
    Unauthorized,
    /// Anything else.
    Other(u16),
}

impl ApiStatus {
    /// Classify a raw HTTP status code.
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Ok,
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            other => Self::Other(other),
        }
    }
}

/// A single upstream response.
///
/// `body` and `next_link` are only populated for [`ApiStatus::Ok`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: ApiStatus,
    pub body: String,
    pub next_link: Option<String>,
}

impl ApiResponse {
    /// A successful response carrying `body`.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Ok,
            body: body.into(),
            next_link: None,
        }
    }

    /// A body-less response with the given status.
    #[must_use]
    pub fn status_only(status: ApiStatus) -> Self {
        Self {
            status,
            body: String::new(),
            next_link: None,
        }
    }

    /// Attach a next-page link.
    #[must_use]
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next_link = Some(next.into());
        self
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Authenticated read access to the upstream API.
///
/// `target` is either a path relative to the API base (`/groups?search=x`)
/// or an absolute URL taken from a pagination link.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// Issue one GET request carrying `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for transport failures only. HTTP error statuses
    /// are reported through [`ApiResponse::status`].
    async fn get(&self, target: &str, credential: &Credential) -> Result<ApiResponse, ApiError>;
}

/// `reqwest`-backed [`RemoteApi`].
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    /// Build a client for `base_url` with a fixed per-request deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };

        // Redirects are never followed: reqwest would carry `PRIVATE-TOKEN`
        // to whatever host the `Location` names. A 3xx surfaces as
        // `ApiStatus::Other`.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("singalong/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Client {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// The API base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a relative path or pagination URL into a full URL.
    ///
    /// Absolute URLs outside the API base are refused so the credential is
    /// never sent to another origin.
    fn url_for(&self, target: &str) -> Result<String, ApiError> {
        if target.starts_with("http://") || target.starts_with("https://") {
            let under_base = target.strip_prefix(&self.base_url).is_some_and(|rest| {
                rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')
            });
            if under_base {
                return Ok(target.to_owned());
            }
            return Err(ApiError::Network {
                url: target.to_owned(),
                reason: "refusing to follow a link outside the API base URL".to_owned(),
            });
        }
        if target.starts_with('/') {
            Ok(format!("{}{}", self.base_url, target))
        } else {
            Ok(format!("{}/{}", self.base_url, target))
        }
    }
}

#[async_trait::async_trait]
impl RemoteApi for HttpApiClient {
    async fn get(&self, target: &str, credential: &Credential) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(target)?;

        // A token that cannot even be expressed as a header can never be
        // accepted upstream.
        let Ok(mut token) = HeaderValue::from_str(credential.expose()) else {
            debug!(url = %url, "credential is not a valid header value");
            return Ok(ApiResponse::status_only(ApiStatus::Unauthorized));
        };
        token.set_sensitive(true);

        let resp = self
            .client
            .get(&url)
            .header(PRIVATE_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;

        let status = ApiStatus::from_code(resp.status().as_u16());
        debug!(url = %url, status = resp.status().as_u16(), "upstream response");

        if status != ApiStatus::Ok {
            return Ok(ApiResponse::status_only(status));
        }

        let next_link = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(link::next_link);

        let body = resp.text().await.map_err(|e| transport_error(&url, &e))?;

        Ok(ApiResponse {
            status,
            body,
            next_link,
        })
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        warn!(url = %url, "upstream request timed out");
        ApiError::Timeout {
            url: url.to_owned(),
        }
    } else {
        warn!(url = %url, error = %err, "upstream request failed");
        ApiError::Network {
            url: url.to_owned(),
            reason: err.to_string(),
        }
    }
}
