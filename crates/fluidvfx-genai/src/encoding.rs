//! Image transport encoding.
//!
//! The service takes images as base64 text with a MIME type. Inputs may
//! arrive as raw file bytes or as a `data:` URL; in the latter case the
//! metadata prefix is stripped and the payload is used as-is.

use std::path::Path;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use image::ImageFormat;

use crate::error::{GenError, GenResult};

/// MIME type assumed when the payload cannot be sniffed.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Standard alphabet, padded on encode, padding-agnostic on decode.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A user-supplied image, as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

impl InputImage {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, file_name: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name,
        }
    }

    /// Read an image file.
    pub async fn from_path(path: impl AsRef<Path>) -> GenResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GenError::encoding(format!("{}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(Self { bytes, file_name })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type sniffed from the leading bytes.
    pub fn mime_type(&self) -> &'static str {
        sniff_mime_type(&self.bytes)
    }
}

/// Base64-encoded image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> GenResult<Self> {
        let (header, payload) = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| GenError::encoding("not a data URL"))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| GenError::encoding("data URL is not base64 encoded"))?;

        let mime_type = if mime_type.is_empty() {
            DEFAULT_IMAGE_MIME
        } else {
            mime_type
        };

        let encoded = Self::new(mime_type, payload.trim());
        encoded.decode()?;
        Ok(encoded)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Reverse of [`encode_input`].
    pub fn decode(&self) -> GenResult<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| GenError::encoding(format!("invalid base64 payload: {}", e)))
    }
}

/// Encode an input image for transport.
pub fn encode_input(input: &InputImage) -> GenResult<EncodedImage> {
    if input.is_empty() {
        return Err(GenError::encoding(match input.file_name() {
            Some(name) => format!("{} is empty", name),
            None => "image is empty".to_string(),
        }));
    }

    if input.bytes().starts_with(b"data:") {
        let text = std::str::from_utf8(input.bytes())
            .map_err(|_| GenError::encoding("data URL is not valid UTF-8"))?;
        return EncodedImage::from_data_url(text.trim());
    }

    Ok(EncodedImage::new(input.mime_type(), BASE64.encode(input.bytes())))
}

/// Guess the MIME type from magic bytes, defaulting to JPEG.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => DEFAULT_IMAGE_MIME,
    }
}
