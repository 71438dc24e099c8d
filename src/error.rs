//! Error types and the fetch error classifier
//!
//! Fetch failures never escape a fetch boundary: the orchestrator converts
//! every `FetchFailure` into a slot `Error` using [`classify_message`]. The
//! rest of the crate only ever sees typed `UIState` values.

use thiserror::Error;

use crate::endpoint::EndpointKind;

const CONNECTION_ERROR_MESSAGE: &str =
    "Connection Error. Check your network and refresh the connection!";

/// Failure reported by an [`ActuatorClient`](crate::client::ActuatorClient) call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response arrived but its body could not be decoded
    #[error("Failed to decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    /// Connection refused, timeout, DNS and other I/O level failures
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

impl FetchFailure {
    /// HTTP status code, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport(_) | Self::Other(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } | Self::Decode { message, .. } => message,
            Self::Transport(message) | Self::Other(message) => message,
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        let status = error.status().map(|s| s.as_u16());
        if error.is_decode() {
            FetchFailure::Decode {
                status: status.unwrap_or(200),
                message: error.to_string(),
            }
        } else if let Some(status) = status {
            FetchFailure::Status {
                status,
                message: error.to_string(),
            }
        } else if error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
        {
            FetchFailure::Transport(error.to_string())
        } else {
            FetchFailure::Other(error.to_string())
        }
    }
}

/// Stable taxonomy of fetch failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// 4xx, usually an endpoint that is not exposed remotely
    Client(u16),
    /// 5xx, other non-2xx statuses and malformed bodies
    Server(u16),
    Connection,
    Unknown(String),
}

impl FetchErrorKind {
    /// User-facing text. `Connection` never includes raw failure text.
    pub fn user_message(&self, endpoint: EndpointKind) -> String {
        match self {
            Self::Client(code) => format!(
                "Request failed: {}. Did you enable the {} endpoint? \
                 Make sure it is exposed via management.endpoints.web.exposure.include.",
                code,
                endpoint.title()
            ),
            Self::Server(code) => format!("Server error: {}", code),
            Self::Connection => CONNECTION_ERROR_MESSAGE.to_string(),
            Self::Unknown(message) => format!("An unknown error occurred: {}", message),
        }
    }
}

/// Map a failure to exactly one taxonomy entry.
pub fn classify(failure: &FetchFailure) -> FetchErrorKind {
    match failure {
        FetchFailure::Status { status, .. } if (400..500).contains(status) => {
            FetchErrorKind::Client(*status)
        }
        FetchFailure::Status { status, .. } | FetchFailure::Decode { status, .. } => {
            FetchErrorKind::Server(*status)
        }
        FetchFailure::Transport(_) => FetchErrorKind::Connection,
        FetchFailure::Other(message) => FetchErrorKind::Unknown(message.clone()),
    }
}

/// Classify a failure and render its message for `endpoint`.
pub fn classify_message(failure: &FetchFailure, endpoint: EndpointKind) -> String {
    classify(failure).user_message(endpoint)
}

/// A base URL that cannot identify a source
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid source URL '{url}': {reason}")]
pub struct InvalidSourceUrl {
    pub url: String,
    pub reason: String,
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    InvalidUrl(#[from] InvalidSourceUrl),

    #[error("Duplicate source '{0}'")]
    DuplicateSource(String),

    #[error("Group '{group}' is empty")]
    EmptyGroup { group: String },

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Errors raised by [`Monitor`](crate::monitor::Monitor) management operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidSourceUrl),

    #[error("Source '{0}' is already registered")]
    DuplicateSource(String),

    #[error("Source '{0}' not found")]
    SourceNotFound(String),

    #[error("Group {0} not found")]
    GroupNotFound(uuid::Uuid),

    #[error("Source '{source_url}' is not a member of group {group}")]
    NotAMember {
        group: uuid::Uuid,
        source_url: String,
    },
}
