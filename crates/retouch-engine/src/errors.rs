use retouch_contracts::{ErrorCategory, TransformError, ValidationError};
use thiserror::Error;

pub const NO_FACE_MESSAGE: &str = "No face was detected. \
     Please upload a clear portrait photo with one visible, front-facing face.";

pub const NON_COMPLIANT_MESSAGE: &str = "The image does not meet the requirements:\n\
     - Format: JPEG, PNG or BMP\n\
     - Size: under 5 MB, between 200x200 and 4096x4096 pixels\n\
     - Face: a single, clearly visible, front-facing face";

pub const UNAVAILABLE_MESSAGE: &str =
    "The transformation service is temporarily unavailable. Please try again later.";

const NO_FACE_CODES: [&str; 3] = [
    "ERROR_NO_FACE_IN_FILE",
    "ERROR_FACE_NOT_FOUND",
    "FACE_NOT_FOUND",
];

const NON_COMPLIANT_CODES: [&str; 4] = [
    "ERROR_IMAGE_NOT_COMPLIANT",
    "ERROR_INVALID_IMAGE_FORMAT",
    "ERROR_IMAGE_SIZE",
    "ERROR_IMAGE_RESOLUTION",
];

const MAX_DETAIL_CHARS: usize = 512;

/// Network-level failures raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("{url} returned an unreadable body: {reason}")]
    Body { url: String, reason: String },
}

/// Every way a single dispatch can end without a result.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("provider API key is not configured")]
    MissingApiKey,

    #[error("provider client could not be created: {0}")]
    ClientSetup(String),

    #[error("provider answered HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("provider error {code}: {message}")]
    ProviderCode {
        code: i64,
        sub_code: Option<String>,
        message: String,
    },

    #[error("provider accepted an async job but returned no task id")]
    MissingJobHandle,

    #[error("provider response has no result payload at '{path}'")]
    NoResultPayload { path: String },

    #[error("provider result payload is malformed: {0}")]
    MalformedPayload(String),

    #[error("job {job_id} failed: {detail}")]
    JobFailed { job_id: String, detail: String },

    #[error("job {job_id} completed with an empty result list")]
    EmptyResultList { job_id: String },

    #[error("job {job_id} still pending after {attempts} status checks")]
    JobTimedOut { job_id: String, attempts: u32 },

    #[error("dispatch cancelled")]
    Cancelled,

    #[error("failed to download result from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchFailure {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::MissingApiKey | Self::ClientSetup(_) => ErrorCategory::Configuration,
            Self::HttpStatus { status, .. } if is_server_fault(i64::from(*status)) => {
                ErrorCategory::ProviderUnavailable
            }
            Self::ProviderCode { code, .. } if is_server_fault(*code) => {
                ErrorCategory::ProviderUnavailable
            }
            Self::HttpStatus { .. }
            | Self::ProviderCode { .. }
            | Self::MissingJobHandle
            | Self::NoResultPayload { .. }
            | Self::MalformedPayload(_) => ErrorCategory::ProviderRejected,
            Self::JobFailed { .. } | Self::EmptyResultList { .. } => ErrorCategory::AsyncFailed,
            Self::JobTimedOut { .. } => ErrorCategory::AsyncTimeout,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Fetch { .. } => ErrorCategory::ResultFetch,
            Self::Transport(_) => ErrorCategory::Transport,
        }
    }

    fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::ProviderUnavailable => return UNAVAILABLE_MESSAGE.to_string(),
            ErrorCategory::Configuration => {
                return "The transformation service is not configured. Contact the operator."
                    .to_string()
            }
            _ => {}
        }
        match self {
            Self::ProviderCode {
                sub_code: Some(sub_code),
                ..
            } if NO_FACE_CODES.contains(&sub_code.as_str()) => NO_FACE_MESSAGE.to_string(),
            Self::ProviderCode {
                sub_code: Some(sub_code),
                ..
            } if NON_COMPLIANT_CODES.contains(&sub_code.as_str()) => {
                NON_COMPLIANT_MESSAGE.to_string()
            }
            Self::ProviderCode { message, .. } => format!(
                "The provider rejected the image: {}",
                truncate_text(message, MAX_DETAIL_CHARS)
            ),
            Self::HttpStatus { status, body } => format!(
                "The provider rejected the request (HTTP {status}): {}",
                truncate_text(body, MAX_DETAIL_CHARS)
            ),
            Self::JobTimedOut { .. } => {
                "The transformation is taking too long. Please try again later.".to_string()
            }
            Self::JobFailed { detail, .. } => format!(
                "The transformation job failed: {}",
                truncate_text(detail, MAX_DETAIL_CHARS)
            ),
            other => truncate_text(&other.to_string(), MAX_DETAIL_CHARS),
        }
    }
}

/// Collapses any dispatch failure into the stable boundary shape.
impl From<DispatchFailure> for TransformError {
    fn from(failure: DispatchFailure) -> Self {
        TransformError::new(failure.category(), failure.user_message())
    }
}

fn is_server_fault(code: i64) -> bool {
    (500..600).contains(&code)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
