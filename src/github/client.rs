// GitHub API HTTP client.
// Handles authentication, rate limiting, redirects, and request/response processing.

use log::warn;
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
    redirect::Policy,
};

use crate::config::Token;
use crate::error::{FailmapError, Result};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = "failmap";

/// GitHub API client with authentication and rate limit tracking.
pub struct GitHubClient {
    /// Authenticated client; never follows redirects so log locations can be read.
    api: Client,
    /// Unauthenticated client for pre-signed download URLs.
    download: Client,
    base_url: String,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token against `base_url`.
    pub fn new(token: &Token, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|e| FailmapError::Config(format!("Invalid token: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let api = Client::builder()
            .default_headers(headers)
            .redirect(Policy::none())
            .build()
            .map_err(FailmapError::Api)?;

        let download = Client::builder()
            .user_agent(CLIENT_USER_AGENT)
            .build()
            .map_err(FailmapError::Api)?;

        Ok(Self {
            api,
            download,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limit: RateLimit::default(),
        })
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &mut self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .api
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(FailmapError::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response).await
    }

    /// Make a GET request and hand back the response whatever its status.
    /// Redirects are returned as-is rather than followed.
    pub async fn get_unchecked(&mut self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.api.get(&url).send().await.map_err(FailmapError::Api)?;

        self.update_rate_limit(&response);
        Ok(response)
    }

    /// Fetch a pre-signed URL without credentials and return its body.
    pub async fn download_text(&self, url: &str) -> Result<String> {
        let response = self
            .download
            .get(url)
            .send()
            .await
            .map_err(FailmapError::Api)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailmapError::Http {
                status,
                url: url.to_string(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.text().await?)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        if let Some(limit) = header("x-ratelimit-limit") {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining") {
            self.rate_limit.remaining = remaining;
            if self.rate_limit.limit > 0 && remaining.saturating_mul(10) < self.rate_limit.limit {
                warn!(
                    "GitHub rate limit low: {} of {} requests remaining",
                    remaining, self.rate_limit.limit
                );
            }
        }
        if let Some(reset) = header("x-ratelimit-reset") {
            self.rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        match status {
            StatusCode::UNAUTHORIZED => Err(FailmapError::Unauthorized),
            StatusCode::NOT_FOUND => Err(FailmapError::NotFound(url)),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
                if self.rate_limit.remaining == 0 && self.rate_limit.reset > 0 =>
            {
                let reset_at = chrono::DateTime::from_timestamp(self.rate_limit.reset as i64, 0)
                    .map(|dt| dt.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(FailmapError::RateLimited { reset_at })
            }
            status => Err(FailmapError::Http {
                status,
                url,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
