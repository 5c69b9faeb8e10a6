// GitHub API HTTP client.
// Handles optional authentication, rate limit tracking, and response status mapping.

use std::sync::{Mutex, PoisonError};

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{HubError, Result};

use super::types::RateLimit;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API client with rate limit tracking.
///
/// Safe to share between concurrent lookups.
#[derive(Debug)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a new GitHub client. Without a token requests are anonymous
    /// and subject to the lower unauthenticated rate limit.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| HubError::Other(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("benefits-hub"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(HubError::Api)?;

        Ok(Self {
            client,
            base_url: GITHUB_API_BASE.to_string(),
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Point the client at a different API root (e.g. GitHub Enterprise).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the most recent rate limit information.
    pub fn rate_limit(&self) -> RateLimit {
        *self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a GET request to the GitHub API.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).send().await.map_err(HubError::Api)?;

        let rate_limit = {
            let mut rate_limit = self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner);
            update_rate_limit(&mut rate_limit, response.headers());
            *rate_limit
        };
        check_response(response, rate_limit).await
    }
}

/// Update rate limit from response headers.
fn update_rate_limit(rate_limit: &mut RateLimit, headers: &HeaderMap) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    };

    if let Some(limit) = header("x-ratelimit-limit") {
        rate_limit.limit = limit;
    }
    if let Some(remaining) = header("x-ratelimit-remaining") {
        rate_limit.remaining = remaining;
    }
    if let Some(reset) = header("x-ratelimit-reset") {
        rate_limit.reset = reset;
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response, rate_limit: RateLimit) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, rate_limit, url, body))
}

fn status_error(status: StatusCode, rate_limit: RateLimit, url: String, body: String) -> HubError {
    match status {
        StatusCode::UNAUTHORIZED => HubError::Unauthorized,
        StatusCode::NOT_FOUND => HubError::NotFound(url),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if rate_limit.is_exhausted() => {
            HubError::RateLimited {
                reset_at: rate_limit.reset_at(),
            }
        }
        StatusCode::FORBIDDEN => HubError::Other(format!("Forbidden: {}", body)),
        status => HubError::Other(format!("HTTP {}: {}", status, body)),
    }
}
