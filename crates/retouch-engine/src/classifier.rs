use retouch_contracts::{EffectDescriptor, ResultLocation};
use serde_json::Value;

use crate::errors::{truncate_text, DispatchFailure, TransportError};
use crate::transport::ProviderReply;

/// A result reference found in a provider body, not yet materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatedPayload {
    /// Base64, possibly already carrying a `data:` prefix.
    Inline(String),
    Remote(String),
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    SyncResult(LocatedPayload),
    AsyncHandle(String),
    ProviderError(DispatchFailure),
    TransportError(TransportError),
}

impl SubmissionOutcome {
    pub fn from_reply(
        reply: Result<ProviderReply, TransportError>,
        descriptor: &EffectDescriptor,
    ) -> Self {
        match reply {
            Ok(reply) => classify(reply.status, &reply.body, descriptor),
            Err(err) => Self::TransportError(err),
        }
    }
}

pub fn classify(status: u16, body: &Value, descriptor: &EffectDescriptor) -> SubmissionOutcome {
    if !(200..300).contains(&status) {
        // A 4xx that still carries a provider error code is classified by
        // that code so that sub-code messages survive.
        if status < 500 {
            if let Some(failure) = provider_code_failure(body) {
                return SubmissionOutcome::ProviderError(failure);
            }
        }
        return SubmissionOutcome::ProviderError(DispatchFailure::HttpStatus {
            status,
            body: body_text(body),
        });
    }

    if let Some(failure) = provider_code_failure(body) {
        return SubmissionOutcome::ProviderError(failure);
    }

    if descriptor.is_async() {
        return match job_id(body) {
            Some(job_id) => SubmissionOutcome::AsyncHandle(job_id),
            None => SubmissionOutcome::ProviderError(DispatchFailure::MissingJobHandle),
        };
    }

    match locate(body, &descriptor.result) {
        Ok(payload) => SubmissionOutcome::SyncResult(payload),
        Err(failure) => SubmissionOutcome::ProviderError(failure),
    }
}

/// Reads `error_code`; zero or absent means success.
pub fn provider_code_failure(body: &Value) -> Option<DispatchFailure> {
    let code = body.get("error_code").and_then(as_code)?;
    if code == 0 {
        return None;
    }
    let detail = body.get("error_detail");
    let sub_code = detail
        .and_then(|detail| detail.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|code| !code.is_empty());
    let message = [
        detail.and_then(|detail| detail.get("code_message")),
        detail.and_then(|detail| detail.get("message")),
        body.get("error_msg"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|message| !message.is_empty())
    .unwrap_or("unknown provider error")
    .to_string();
    Some(DispatchFailure::ProviderCode {
        code,
        sub_code,
        message,
    })
}

pub fn job_id(body: &Value) -> Option<String> {
    match body.get("task_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub fn locate(body: &Value, location: &ResultLocation) -> Result<LocatedPayload, DispatchFailure> {
    let path = location.path();
    let missing = || DispatchFailure::NoResultPayload {
        path: path.join("."),
    };
    let found = path
        .iter()
        .try_fold(body, |node, key| node.get(*key))
        .ok_or_else(missing)?;

    let text = match location {
        ResultLocation::Inline(_) | ResultLocation::Remote(_) => found,
        ResultLocation::FirstItem(_) => match found {
            Value::Array(items) => items.first().ok_or_else(missing)?,
            _ => {
                return Err(DispatchFailure::MalformedPayload(format!(
                    "expected a list at '{}'",
                    path.join(".")
                )))
            }
        },
    }
    .as_str()
    .map(str::trim)
    .filter(|text| !text.is_empty())
    .ok_or_else(missing)?;

    Ok(match location {
        ResultLocation::Inline(_) => LocatedPayload::Inline(text.to_string()),
        ResultLocation::Remote(_) => LocatedPayload::Remote(text.to_string()),
        ResultLocation::FirstItem(_) if is_url(text) => LocatedPayload::Remote(text.to_string()),
        ResultLocation::FirstItem(_) => LocatedPayload::Inline(text.to_string()),
    })
}

fn is_url(text: &str) -> bool {
    text.starts_with("https://") || text.starts_with("http://")
}

pub(crate) fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn body_text(body: &Value) -> String {
    let text = match body {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    truncate_text(&text, 2_048)
}
