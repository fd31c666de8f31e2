//! Error types for the Scrumy client.

use std::fmt;
use thiserror::Error;

/// Boxed error returned by a [`Fetch`](crate::scrumy::http::Fetch) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ScrumyError>;

/// Which URL template of a resource was needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    List,
    Show,
    Current,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::List => f.write_str("list"),
            TemplateKind::Show => f.write_str("show"),
            TemplateKind::Current => f.write_str("current"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrumyError {
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("resource already registered: {0}")]
    DuplicateResource(String),

    #[error("resource {resource} declares unregistered parent {parent}")]
    UnknownParent { resource: String, parent: String },

    #[error("invalid definition for {resource}: {reason}")]
    InvalidDefinition { resource: String, reason: String },

    #[error("failed to parse resource table")]
    ResourceTable(#[source] serde_json::Error),

    #[error("resource {resource} has no {kind} URL")]
    MissingTemplate {
        resource: String,
        kind: TemplateKind,
    },

    #[error("no identifier supplied for {template}")]
    MissingIdentifier { template: String },

    #[error("{field} is not a lazy field of {resource}")]
    NotLazyField { resource: String, field: String },

    #[error("request to {url} failed with status {status}")]
    Fetch { url: String, status: u16 },

    #[error("malformed JSON from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} has no {root} root key")]
    MissingRootKey { url: String, root: String },

    #[error("expected a JSON object for {resource}, found {found}")]
    UnexpectedShape { resource: String, found: String },

    #[error("problem fetching {url}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },
}

impl ScrumyError {
    /// URL of the request that failed, if the error came from a fetch
    pub fn url(&self) -> Option<&str> {
        match self {
            ScrumyError::Fetch { url, .. }
            | ScrumyError::Decode { url, .. }
            | ScrumyError::MissingRootKey { url, .. }
            | ScrumyError::Transport { url, .. } => Some(url),
            _ => None,
        }
    }

    /// HTTP status for non-200 responses
    pub fn status(&self) -> Option<u16> {
        match self {
            ScrumyError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Short name of a JSON value's type, used in shape errors
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
