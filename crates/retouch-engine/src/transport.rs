use std::fmt;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;

use crate::builder::{PartBody, ProviderRequest};
use crate::config::ProviderConfig;
use crate::errors::{truncate_text, DispatchFailure, TransportError};

pub const API_KEY_HEADER: &str = "ailabapi-api-key";
pub const JOB_STATUS_PATH: &str = "common/query-async-task-result";

/// Status and JSON body of one provider answer. Non-JSON bodies are kept as
/// a string value so that error bodies still reach the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

impl ProviderReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network seam. Dispatch logic never talks to reqwest directly.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn submit(&self, request: &ProviderRequest) -> Result<ProviderReply, TransportError>;

    async fn query_job(&self, job_id: &str) -> Result<ProviderReply, TransportError>;

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_base: String,
    api_key: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self, DispatchFailure> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| DispatchFailure::ClientSetup(err.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn job_status_url(&self) -> String {
        format!("{}/{JOB_STATUS_PATH}", self.api_base)
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn submit(&self, request: &ProviderRequest) -> Result<ProviderReply, TransportError> {
        let url = request.descriptor.endpoint_url(&self.api_base);
        let form = multipart_form(request, &url)?;
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        read_reply(url, response).await
    }

    async fn query_job(&self, job_id: &str) -> Result<ProviderReply, TransportError> {
        let url = self.job_status_url();
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("task_id", job_id)])
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        read_reply(url, response).await
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, 256),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

fn multipart_form(request: &ProviderRequest, url: &str) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in &request.parts {
        form = match &part.body {
            PartBody::Text(value) => form.text(part.name, value.clone()),
            PartBody::File {
                bytes,
                file_name,
                mime,
            } => {
                let file = Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|err| TransportError::Body {
                        url: url.to_string(),
                        reason: format!("invalid mime type {mime}: {err}"),
                    })?;
                form.part(part.name, file)
            }
        };
    }
    Ok(form)
}

async fn read_reply(url: String, response: Response) -> Result<ProviderReply, TransportError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| TransportError::Request {
            url: url.clone(),
            source,
        })?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => Value::String(text),
        Err(err) => {
            return Err(TransportError::Body {
                url,
                reason: format!("expected JSON: {err}"),
            })
        }
    };
    Ok(ProviderReply {
        status: status.as_u16(),
        body,
    })
}
