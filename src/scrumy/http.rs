//! HTTP utilities for Scrumy REST API calls

use super::auth::Credentials;
use crate::error::{BoxError, ScrumyError};
use async_trait::async_trait;
use reqwest::Client;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..cut],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw response handed back by a fetcher
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Transport used by the dispatcher to issue GET requests.
///
/// Implementations only move bytes: status interpretation, JSON decoding and
/// error wrapping happen in the dispatcher.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> std::result::Result<FetchResponse, BoxError>;
}

/// reqwest-backed fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new() -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("scrumy-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> std::result::Result<FetchResponse, BoxError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.project, Some(credentials.password()))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

/// Format a client error for display
/// Security: Keeps messages short and free of response bodies
pub fn format_scrumy_error(error: &ScrumyError) -> String {
    match error {
        ScrumyError::Fetch { status: 401, url } | ScrumyError::Fetch { status: 403, url } => {
            format!(
                "Authentication failed for {}. Check project and password.",
                url
            )
        }
        ScrumyError::Fetch { status: 404, url } => format!("Not found: {}", url),
        ScrumyError::Fetch { status, url } if *status >= 500 => {
            format!("Scrumy is unavailable ({}) at {}. Please try again.", status, url)
        }
        ScrumyError::Transport { url, .. } => {
            format!("Problem fetching {}. Check your network connection.", url)
        }
        other => {
            let message = other.to_string();
            let sanitized = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect::<String>();
            if sanitized.len() < message.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}
