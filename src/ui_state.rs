//! Result container for one fetched value.
//!
//! A per-source slot only ever holds `Loading`, `Success` or `Error`.
//! `PartialSuccess` is produced exclusively by the cross-source aggregator.

use serde::Serialize;

/// Lifecycle of one fetched (or aggregated) value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UIState<T> {
    /// Initial state, re-entered on demand before a refresh
    Loading,
    /// The fetch completed and decoded
    Success { data: T },
    /// The fetch failed; carries the classified, user-facing message
    Error { message: String },
    /// Some sources contributed data, the rest are listed as warnings
    PartialSuccess { data: T, warnings: Vec<String> },
}

impl<T> Default for UIState<T> {
    fn default() -> Self {
        UIState::Loading
    }
}

impl<T> UIState<T> {
    pub fn success(data: T) -> Self {
        UIState::Success { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        UIState::Error {
            message: message.into(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UIState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UIState::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, UIState::Error { .. })
    }

    /// Data carried by `Success` or `PartialSuccess`.
    pub fn data(&self) -> Option<&T> {
        match self {
            UIState::Success { data } | UIState::PartialSuccess { data, .. } => Some(data),
            UIState::Loading | UIState::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UIState::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            UIState::PartialSuccess { warnings, .. } => warnings,
            _ => &[],
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> UIState<U> {
        match self {
            UIState::Loading => UIState::Loading,
            UIState::Success { data } => UIState::Success { data: f(data) },
            UIState::Error { message } => UIState::Error { message },
            UIState::PartialSuccess { data, warnings } => UIState::PartialSuccess {
                data: f(data),
                warnings,
            },
        }
    }
}
