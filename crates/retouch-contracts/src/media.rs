use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Media type the provider is assumed to return for a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Mp4,
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Mp4 => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Formats the provider accepts as upload input.
const ACCEPTED_UPLOADS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

/// Checks magic bytes only; the image is never decoded.
pub fn sniff_image(field: &'static str, bytes: &[u8]) -> Result<ImageFormat, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::UnsupportedImage {
            field,
            reason: "image is empty".to_string(),
        });
    }
    let format = image::guess_format(bytes).map_err(|err| ValidationError::UnsupportedImage {
        field,
        reason: err.to_string(),
    })?;
    if !ACCEPTED_UPLOADS.contains(&format) {
        return Err(ValidationError::UnsupportedImage {
            field,
            reason: format!("{} uploads are not accepted", format.to_mime_type()),
        });
    }
    Ok(format)
}

/// Mime type and file extension to label an accepted upload with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadFormat {
    pub mime: &'static str,
    pub extension: &'static str,
}

pub fn sniff_upload(field: &'static str, bytes: &[u8]) -> Result<UploadFormat, ValidationError> {
    let format = sniff_image(field, bytes)?;
    Ok(UploadFormat {
        mime: format.to_mime_type(),
        extension: format.extensions_str().first().copied().unwrap_or("bin"),
    })
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Splits `data:<mime>;base64,<payload>` into its mime and still-encoded payload.
pub fn split_data_uri(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.trim().strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}

pub fn decode_data_uri(raw: &str) -> anyhow::Result<(String, Vec<u8>)> {
    let (mime, payload) =
        split_data_uri(raw).ok_or_else(|| anyhow::anyhow!("not a base64 data URI"))?;
    let bytes = decode_base64(payload)?;
    Ok((mime.to_string(), bytes))
}

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Decodes base64 that may carry a data URI prefix or embedded line breaks.
/// Padding is optional and the URL-safe alphabet is accepted too.
pub fn decode_base64(raw: &str) -> anyhow::Result<Vec<u8>> {
    let payload = split_data_uri(raw).map(|(_, payload)| payload).unwrap_or(raw);
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    match LENIENT_STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => Ok(bytes),
        Err(err) => LENIENT_URL_SAFE
            .decode(compact.as_bytes())
            .map_err(|_| anyhow::Error::from(err)),
    }
}
