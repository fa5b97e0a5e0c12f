use retouch_contracts::{
    EffectCatalog, TransformError, TransformResponse, TransformationKind, TransformationParams,
    TransformedMedia,
};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::builder::RequestBuilder;
use crate::classifier::SubmissionOutcome;
use crate::config::ProviderConfig;
use crate::errors::DispatchFailure;
use crate::materializer::materialize;
use crate::poller::JobPoller;
use crate::transport::{HttpTransport, ProviderTransport};

/// Runs one transformation end to end: build, submit, classify, poll when
/// the kind is async, then materialize.
pub struct Dispatcher<T> {
    catalog: &'static EffectCatalog,
    transport: T,
    poller: JobPoller,
}

impl Dispatcher<HttpTransport> {
    /// Fails with a configuration error when no API key is set, so nothing
    /// reaches the network.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, TransformError> {
        let transport = HttpTransport::new(config).map_err(TransformError::from)?;
        Ok(Self::new(transport).with_poller(JobPoller::new(
            config.poll_interval,
            config.max_attempts,
        )))
    }
}

impl<T: ProviderTransport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            catalog: EffectCatalog::shared(),
            transport,
            poller: JobPoller::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: &'static EffectCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_poller(mut self, poller: JobPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn transform(
        &self,
        kind: TransformationKind,
        params: &TransformationParams,
        image: &[u8],
        cancel: &CancellationToken,
    ) -> Result<TransformedMedia, TransformError> {
        let span = info_span!(
            "transform",
            request_id = %Uuid::new_v4(),
            kind = %kind,
            image_digest = %image_digest(image)
        );
        async move {
            info!(image_bytes = image.len(), "dispatch started");
            match self.run(kind, params, image, cancel).await {
                Ok(media) => {
                    info!(media_type = %media.media_type, "dispatch finished");
                    Ok(media)
                }
                Err(failure) => {
                    let category = failure.category();
                    warn!(category = category.as_str(), error = %failure, "dispatch failed");
                    Err(TransformError::from(failure))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// For hosts without a disconnect signal.
    pub async fn transform_default(
        &self,
        kind: TransformationKind,
        params: &TransformationParams,
        image: &[u8],
    ) -> Result<TransformedMedia, TransformError> {
        self.transform(kind, params, image, &CancellationToken::new()).await
    }

    /// Same as [`Dispatcher::transform`], collapsed into the uniform shape.
    pub async fn respond(
        &self,
        kind: TransformationKind,
        params: &TransformationParams,
        image: &[u8],
        cancel: &CancellationToken,
    ) -> TransformResponse {
        TransformResponse::from(self.transform(kind, params, image, cancel).await)
    }

    async fn run(
        &self,
        kind: TransformationKind,
        params: &TransformationParams,
        image: &[u8],
        cancel: &CancellationToken,
    ) -> Result<TransformedMedia, DispatchFailure> {
        let request = RequestBuilder::new(self.catalog).build(kind, params, image)?;
        if cancel.is_cancelled() {
            return Err(DispatchFailure::Cancelled);
        }
        let descriptor = &request.descriptor;

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchFailure::Cancelled),
            reply = self.transport.submit(&request) => reply,
        };

        let payload = match SubmissionOutcome::from_reply(reply, descriptor) {
            SubmissionOutcome::SyncResult(payload) => payload,
            SubmissionOutcome::AsyncHandle(job_id) => {
                info!(job_id = %job_id, "provider accepted async job");
                self.poller
                    .run(&self.transport, &job_id, &descriptor.result, cancel)
                    .await?
            }
            SubmissionOutcome::ProviderError(failure) => return Err(failure),
            SubmissionOutcome::TransportError(err) => return Err(err.into()),
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DispatchFailure::Cancelled),
            media = materialize(&self.transport, payload, descriptor.media) => media,
        }
    }
}

fn image_digest(image: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(image));
    digest[..8].to_string()
}
