//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent and session cookie
//! - Issuing exactly one attempt per `fetch` call and classifying its outcome
//! - The caller-side bounded retry wrapper for transport failures
//!
//! Only transport failures are retried. A 404 or any other non-2xx status is
//! a terminal outcome the caller handles explicitly.

use crate::config::{SiteConfig, UserAgentConfig};
use crate::state::RetryState;
use crate::{ConfigError, MirrorError, RetryExhausted};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{redirect::Policy, Client, StatusCode};
use url::Url;

/// Result of a single request attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Success {
        body: Vec<u8>,
        /// Final URL after redirects
        final_url: Url,
        status_code: u16,
    },

    /// HTTP 404
    NotFound { final_url: Url },

    /// Any other non-2xx status
    HttpError { status_code: u16, final_url: Url },

    /// Connection, timeout or body read failure
    TransientFailure { error: String },
}

impl FetchOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure { .. })
    }
}

#[derive(Debug, Clone)]
enum RequestMethod {
    Get,
    PostForm(Vec<(&'static str, String)>),
}

/// One HTTP request description
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: Url,
    method: RequestMethod,
    headers: Vec<(HeaderName, String)>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: RequestMethod::Get,
            headers: Vec::new(),
        }
    }

    /// Form-encoded POST with fields in the given order
    pub fn post_form(url: Url, fields: Vec<(&'static str, String)>) -> Self {
        Self {
            url,
            method: RequestMethod::PostForm(fields),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Builds the HTTP client shared by every walker
///
/// The optional session cookie is attached verbatim to every request.
pub fn build_http_client(
    site: &SiteConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, MirrorError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = &site.session_cookie {
        let mut value = HeaderValue::from_str(cookie)
            .map_err(|e| ConfigError::Validation(format!("Invalid session-cookie: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }

    let client = Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Issues requests over the shared transport
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs exactly one network attempt
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let mut builder = match &request.method {
            RequestMethod::Get => self.client.get(request.url.clone()),
            RequestMethod::PostForm(fields) => self.client.post(request.url.clone()).form(fields),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.clone(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchOutcome::TransientFailure {
                    error: describe_error(&e),
                }
            }
        };

        let status = response.status();
        let final_url = response.url().clone();

        if status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound { final_url };
        }

        if !status.is_success() {
            return FetchOutcome::HttpError {
                status_code: status.as_u16(),
                final_url,
            };
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                final_url,
                status_code: status.as_u16(),
            },
            Err(e) => FetchOutcome::TransientFailure {
                error: describe_error(&e),
            },
        }
    }

    /// Re-issues `request` while it fails at the transport level
    ///
    /// `retry` is owned by the caller's unit of work. Once its limit is
    /// exceeded the unit is abandoned with `RetryExhausted`. Non-transient
    /// outcomes are returned as-is, never retried.
    pub async fn fetch_with_retry(
        &self,
        request: &FetchRequest,
        retry: &mut RetryState,
    ) -> Result<FetchOutcome, RetryExhausted> {
        loop {
            match self.fetch(request).await {
                FetchOutcome::TransientFailure { error } => {
                    if retry.record_failure() {
                        return Err(RetryExhausted {
                            url: request.url.to_string(),
                            attempts: retry.attempts(),
                            last_error: error,
                        });
                    }
                    tracing::warn!(
                        "Request to {} failed, retrying ({} of {}): {}",
                        request.url,
                        retry.attempts(),
                        retry.limit(),
                        error
                    );
                }
                outcome => return Ok(outcome),
            }
        }
    }
}

/// Decodes a response body as text, replacing invalid UTF-8
pub fn decode_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
