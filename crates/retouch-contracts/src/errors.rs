use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kinds::TransformationKind;

/// Caller-fixable problems found before anything is sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown transformation kind '{0}'")]
    UnknownKind(String),

    #[error("parameters for '{found}' were supplied for a '{expected}' request")]
    ParamsMismatch {
        expected: TransformationKind,
        found: TransformationKind,
    },

    #[error("invalid parameters for '{kind}': {reason}")]
    MalformedParams {
        kind: TransformationKind,
        reason: String,
    },

    #[error("invalid '{field}': {reason}")]
    InvalidParam { field: &'static str, reason: String },

    #[error("missing required parameter '{0}'")]
    MissingParam(&'static str),

    #[error("'{field}' is not a supported image: {reason}")]
    UnsupportedImage { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            field,
            reason: reason.into(),
        }
    }
}

/// Stable failure taxonomy exposed to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Configuration,
    ProviderRejected,
    ProviderUnavailable,
    AsyncTimeout,
    AsyncFailed,
    ResultFetch,
    Transport,
    Cancelled,
}

impl ErrorCategory {
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::ProviderRejected => 400,
            Self::ProviderUnavailable => 503,
            Self::AsyncTimeout => 408,
            Self::Cancelled => 499,
            Self::Configuration | Self::AsyncFailed | Self::ResultFetch | Self::Transport => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::ProviderRejected => "provider_rejected",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::AsyncTimeout => "async_timeout",
            Self::AsyncFailed => "async_failed",
            Self::ResultFetch => "result_fetch",
            Self::Transport => "transport",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only failure object that crosses the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category} ({http_status}): {message}")]
pub struct TransformError {
    pub category: ErrorCategory,
    pub message: String,
    pub http_status: u16,
}

impl TransformError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            http_status: category.http_status(),
        }
    }
}

impl From<ValidationError> for TransformError {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorCategory::Validation, err.to_string())
    }
}
