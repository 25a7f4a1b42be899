//! Panel image payloads: resolve a reference to bytes, then decode and
//! re-encode as JPEG for embedding.

use std::io::Cursor;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use reqwest::Client;

use crate::backend::HttpTimeouts;
use crate::error::ComicError;

const JPEG_QUALITY: u8 = 90;

/// Where a panel's image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRef<'a> {
    /// `data:<mime>;base64,<payload>`
    Inline(&'a str),
    Remote(&'a str),
    Local(PathBuf),
}

impl<'a> PayloadRef<'a> {
    pub fn classify(reference: &'a str) -> Self {
        let trimmed = reference.trim();
        if trimmed.starts_with("data:") {
            PayloadRef::Inline(trimmed)
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            PayloadRef::Remote(trimmed)
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            PayloadRef::Local(PathBuf::from(path))
        } else {
            PayloadRef::Local(PathBuf::from(trimmed))
        }
    }
}

/// Decode a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "Not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "Data URI has no payload".to_string())?;
    if !header.ends_with(";base64") {
        return Err(format!("Unsupported data URI encoding '{}'", header));
    }
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| format!("Invalid base64 payload: {}", e))
}

/// A decoded panel ready to embed as a DCT-encoded image.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EmbeddedImage {
    /// Decode any supported image format and re-encode it as RGB JPEG.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| format!("Unreadable image: {}", e))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err("Image has no pixels".to_string());
        }
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| format!("JPEG encoding failed: {}", e))?;
        Ok(Self {
            jpeg,
            width,
            height,
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Fetches panel payloads from any supported reference.
pub struct PayloadResolver {
    client: Client,
}

impl PayloadResolver {
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ComicError> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| ComicError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, reference: &str) -> Result<Vec<u8>, String> {
        match PayloadRef::classify(reference) {
            PayloadRef::Inline(uri) => decode_data_uri(uri),
            PayloadRef::Remote(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| format!("Download failed: {}", e))?;
                if !response.status().is_success() {
                    return Err(format!("Download failed with status {}", response.status()));
                }
                response
                    .bytes()
                    .await
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| format!("Download interrupted: {}", e))
            }
            PayloadRef::Local(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e)),
        }
    }

    /// Resolve and decode in one step.
    pub async fn load(&self, reference: &str) -> Result<EmbeddedImage, String> {
        let bytes = self.fetch(reference).await?;
        EmbeddedImage::from_bytes(&bytes)
    }
}
