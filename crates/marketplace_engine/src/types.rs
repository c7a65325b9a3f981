use std::fmt;

use marketplace_core::{Epoch, Page, PageRequest};
use thiserror::Error;

/// Every remote failure surfaces as `Unavailable`; `kind` is diagnostic only
/// and callers handle all kinds the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("listings unavailable ({kind}): {message}")]
    Unavailable { kind: FailureKind, message: String },
}

impl FetchError {
    pub fn unavailable(kind: FailureKind, message: impl Into<String>) -> Self {
        FetchError::Unavailable {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &FailureKind {
        match self {
            FetchError::Unavailable { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    HttpStatus(u16),
    PermissionDenied,
    MalformedQuery,
    MalformedResponse,
    /// The engine stopped before running the fetch.
    Stopped,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::PermissionDenied => write!(f, "permission denied"),
            FailureKind::MalformedQuery => write!(f, "malformed query"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Stopped => write!(f, "engine stopped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PageFetched {
        epoch: Epoch,
        request: PageRequest,
        result: Result<Page, FetchError>,
    },
}
