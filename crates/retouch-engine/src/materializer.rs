use retouch_contracts::media::{decode_base64, encode_data_uri, split_data_uri};
use retouch_contracts::{MediaType, TransformedMedia};
use tracing::debug;

use crate::classifier::LocatedPayload;
use crate::errors::DispatchFailure;
use crate::transport::ProviderTransport;

/// Turns a located payload into a data URI. Remote payloads are fetched
/// exactly once.
pub async fn materialize<T>(
    transport: &T,
    payload: LocatedPayload,
    media: MediaType,
) -> Result<TransformedMedia, DispatchFailure>
where
    T: ProviderTransport + ?Sized,
{
    match payload {
        LocatedPayload::Inline(raw) => inline(&raw, media),
        LocatedPayload::Remote(url) => {
            let bytes = transport
                .fetch(&url)
                .await
                .map_err(|err| DispatchFailure::Fetch {
                    url: url.clone(),
                    reason: err.to_string(),
                })?;
            if bytes.is_empty() {
                return Err(DispatchFailure::Fetch {
                    url,
                    reason: "empty response body".to_string(),
                });
            }
            debug!(url = %url, bytes = bytes.len(), "downloaded result");
            Ok(TransformedMedia {
                media_type: media.mime().to_string(),
                data_uri: encode_data_uri(media.mime(), &bytes),
            })
        }
    }
}

fn inline(raw: &str, media: MediaType) -> Result<TransformedMedia, DispatchFailure> {
    let bytes = decode_base64(raw)
        .map_err(|err| DispatchFailure::MalformedPayload(format!("inline result: {err}")))?;
    if bytes.is_empty() {
        return Err(DispatchFailure::MalformedPayload(
            "inline result is empty".to_string(),
        ));
    }
    // A declared type on the payload wins over the per-kind default.
    let mime = split_data_uri(raw)
        .map(|(mime, _)| mime.trim().to_string())
        .filter(|mime| !mime.is_empty())
        .unwrap_or_else(|| media.mime().to_string());
    Ok(TransformedMedia {
        data_uri: encode_data_uri(&mime, &bytes),
        media_type: mime,
    })
}
