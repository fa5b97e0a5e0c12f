//! Dispatch engine: turns a typed transformation request into provider
//! calls and normalizes whatever comes back.

pub mod builder;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod materializer;
pub mod poller;
pub mod transport;

use retouch_contracts::{TransformResponse, TransformationKind, TransformationParams};
use tokio_util::sync::CancellationToken;

pub use builder::{FormPart, PartBody, ProviderRequest, RequestBuilder};
pub use classifier::{LocatedPayload, SubmissionOutcome};
pub use config::ProviderConfig;
pub use dispatcher::Dispatcher;
pub use errors::{DispatchFailure, TransportError};
pub use poller::{AsyncJob, JobPoller, JobStatus, PollState};
pub use transport::{HttpTransport, ProviderReply, ProviderTransport};

/// One-shot entry point for hosts that do not keep a dispatcher around.
/// Never fails; every outcome is folded into the response.
pub async fn transform(
    config: &ProviderConfig,
    kind: TransformationKind,
    params: &TransformationParams,
    image: &[u8],
    cancel: &CancellationToken,
) -> TransformResponse {
    match Dispatcher::from_config(config) {
        Ok(dispatcher) => dispatcher.respond(kind, params, image, cancel).await,
        Err(err) => TransformResponse::from(Err(err)),
    }
}
