use serde::{Deserialize, Serialize};

use crate::errors::{ErrorCategory, TransformError};

/// A finished transformation, normalized to one data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedMedia {
    pub media_type: String,
    pub data_uri: String,
}

/// Uniform outcome handed back to hosts: `{success, media}` or
/// `{success: false, error, httpStatus}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<TransformedMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl From<Result<TransformedMedia, TransformError>> for TransformResponse {
    fn from(outcome: Result<TransformedMedia, TransformError>) -> Self {
        match outcome {
            Ok(media) => Self {
                success: true,
                media: Some(media),
                error: None,
                category: None,
                http_status: None,
            },
            Err(err) => Self {
                success: false,
                media: None,
                error: Some(err.message),
                category: Some(err.category),
                http_status: Some(err.http_status),
            },
        }
    }
}
