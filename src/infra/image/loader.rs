use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use crate::domain::{MAX_IMAGE_BYTES, is_supported_image_mime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSourceData {
    pub mime_type: String,
    pub data_url: String,
    pub source_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageLoadError {
    #[error("unsupported file type: {detected}")]
    UnsupportedType { detected: String },
    #[error("file is {size_bytes} bytes, above the {MAX_IMAGE_BYTES} byte ceiling")]
    TooLarge { size_bytes: u64 },
    #[error("failed to read image file: {message}")]
    Io { message: String },
}

/// Loads an image file into a base64 data-URL. The size ceiling is enforced
/// from file metadata before the bytes are read.
pub fn load_image_source(path: impl AsRef<Path>) -> Result<ImageSourceData, ImageLoadError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|error| ImageLoadError::Io {
        message: error.to_string(),
    })?;
    if metadata.len() > MAX_IMAGE_BYTES {
        return Err(ImageLoadError::TooLarge {
            size_bytes: metadata.len(),
        });
    }

    let bytes = fs::read(path).map_err(|error| ImageLoadError::Io {
        message: error.to_string(),
    })?;
    encode_image_source(&bytes, path)
}

pub fn encode_image_source(
    bytes: &[u8],
    path: impl AsRef<Path>,
) -> Result<ImageSourceData, ImageLoadError> {
    let path = path.as_ref();
    let mime_type = sniff_mime_type(bytes)
        .or_else(|| mime_type_from_extension(path))
        .ok_or_else(|| ImageLoadError::UnsupportedType {
            detected: describe_unknown_source(path),
        })?;
    if !is_supported_image_mime(mime_type) {
        return Err(ImageLoadError::UnsupportedType {
            detected: mime_type.to_string(),
        });
    }

    Ok(ImageSourceData {
        mime_type: mime_type.to_string(),
        data_url: format!("data:{mime_type};base64,{}", BASE64.encode(bytes)),
        source_bytes: bytes.len() as u64,
    })
}

/// Identifies the image format from magic bytes. Extension fallback covers
/// valid images saved with unusual headers.
fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

fn mime_type_from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn describe_unknown_source(path: &Path) -> String {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{extension}"))
        .unwrap_or_else(|| "unknown format".to_string())
}
