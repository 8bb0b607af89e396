//! HTTP transport
//!
//! The orchestrator talks to the network only through the [`Transport`] trait, so
//! scheduling and dispatch can be exercised against in-memory doubles. The real
//! implementation wraps a `reqwest` client with the crawler's user agent and a fixed
//! per-request timeout, and decodes bodies with the declared or sniffed charset.

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::{header, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Number of leading body bytes searched for a `<meta charset>` declaration
const CHARSET_SNIFF_LEN: usize = 1024;

/// A fetched response, already decoded to text
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Decoded body
    pub body: String,
}

impl FetchedPage {
    /// Only a plain 200 counts as a usable page
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Network-level failures
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl TransportError {
    fn from_reqwest(url: &Url, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            Self::Body {
                url,
                message: err.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Fetches a URL and returns its status and decoded body
///
/// Non-2xx statuses are returned as pages, not errors; callers decide what a status
/// means (robots.txt treats 404 and 500 differently, pages treat both as failures).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the transport from configuration
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Identity sent with every request
    /// * `crawler` - Supplies the per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(HttpTransport)` - Ready to fetch
    /// * `Err(reqwest::Error)` - The TLS backend could not be initialised
    pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(crawler.fetch_timeout_secs);
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        Ok(FetchedPage {
            final_url,
            status,
            body: decode_body(&bytes, content_type.as_deref()),
            content_type,
        })
    }
}

/// Decodes a response body to text
///
/// The charset comes from the Content-Type header if present, else from a
/// `<meta charset>` (or `http-equiv` content) declaration near the top of the body,
/// else UTF-8. Malformed sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches('"').as_bytes())
    })
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(CHARSET_SNIFF_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .chars()
        .skip_while(|c| *c == '"' || *c == '\'')
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    Encoding::for_label(label.as_bytes())
}
