//! Camera boundary - frame acquisition and encoding
//!
//! ## Responsibilities
//!
//! - Define the acquire/sample/stop contract against a camera resource
//! - Encode sampled frames as JPEG payloads for analysis and logging
//! - Provide a deterministic in-process source for the shell and tests
//!
//! Driver-level capture is an external collaborator; only the stream
//! lifecycle contract is owned here.

use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Facing preference passed to acquisition.
///
/// `Environment` requests the outward-facing camera where available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Environment,
    User,
}

impl Facing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Environment => "environment",
            Facing::User => "user",
        }
    }
}

/// One sampled video frame, raw RGBA at native stream resolution
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Raw RGBA pixel buffer, row-major
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

/// Self-describing encoded image payload: media type plus base64 bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    /// Media type, e.g. `image/jpeg`
    pub media_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

impl EncodedImage {
    /// Embeddable `data:` URI form
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Encode a frame as JPEG at the given quality and wrap it as an
/// [`EncodedImage`] payload.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<EncodedImage> {
    let rgba = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| {
            Error::Internal(format!(
                "Frame buffer does not match {}x{} RGBA",
                frame.width, frame.height
            ))
        })?;

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    rgb.write_with_encoder(encoder)?;

    Ok(EncodedImage {
        media_type: "image/jpeg".to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

/// A camera resource that can hand out streams
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Request a stream from the hardware resource.
    ///
    /// Fails with [`Error::Permission`] when access is denied or no
    /// device is available.
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn CameraStream>>;
}

/// An acquired media stream
#[async_trait]
pub trait CameraStream: Send + Sync {
    /// Sample the current video frame at native resolution
    async fn sample(&mut self) -> Result<Frame>;

    /// Native stream resolution (width, height)
    fn resolution(&self) -> (u32, u32);

    /// Stop all tracks and release the underlying handle.
    ///
    /// Must be safe to call more than once.
    fn stop(&mut self);
}

/// Deterministic in-process camera source.
///
/// Produces a moving gradient test pattern so the full pipeline can run
/// without hardware. Construct with [`SyntheticCamera::unavailable`] to
/// exercise the denied-permission path.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    available: bool,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            available: true,
        }
    }

    /// A source that always denies acquisition
    pub fn unavailable() -> Self {
        Self {
            width: 0,
            height: 0,
            available: false,
        }
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn CameraStream>> {
        if !self.available {
            tracing::warn!(facing = facing.as_str(), "Camera access denied");
            return Err(Error::Permission(
                "Unable to access camera. Please allow permissions.".to_string(),
            ));
        }

        tracing::info!(
            facing = facing.as_str(),
            width = self.width,
            height = self.height,
            "Synthetic camera stream acquired"
        );
        Ok(Box::new(SyntheticStream {
            width: self.width,
            height: self.height,
            frame_no: 0,
            stopped: false,
        }))
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    frame_no: u64,
    stopped: bool,
}

#[async_trait]
impl CameraStream for SyntheticStream {
    async fn sample(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(Error::Internal("Stream already stopped".to_string()));
        }

        self.frame_no += 1;
        let shift = (self.frame_no % 256) as u32;
        let mut data = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push(((x + shift) % 256) as u8);
                data.push(((y + shift) % 256) as u8);
                data.push(((x + y) % 256) as u8);
                data.push(255);
            }
        }

        Ok(Frame {
            width: self.width,
            height: self.height,
            data,
            captured_at: Utc::now(),
        })
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_sample() {
        let source = SyntheticCamera::new(8, 8);
        let mut stream = source.acquire(Facing::Environment).await.unwrap();

        let frame = stream.sample().await.unwrap();
        assert_eq!((frame.width, frame.height), (8, 8));
        assert_eq!(frame.data.len(), 8 * 8 * 4);
        assert_eq!(stream.resolution(), (8, 8));
    }

    #[tokio::test]
    async fn test_unavailable_source_denies() {
        let source = SyntheticCamera::unavailable();
        let err = match source.acquire(Facing::Environment).await {
            Ok(_) => panic!("expected acquisition to be denied"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::Permission(_)));
    }

    #[tokio::test]
    async fn test_sample_after_stop_fails() {
        let source = SyntheticCamera::new(4, 4);
        let mut stream = source.acquire(Facing::User).await.unwrap();
        stream.stop();
        assert!(stream.sample().await.is_err());
    }

    #[tokio::test]
    async fn test_encode_jpeg_payload() {
        let source = SyntheticCamera::new(16, 16);
        let mut stream = source.acquire(Facing::Environment).await.unwrap();
        let frame = stream.sample().await.unwrap();

        let encoded = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(encoded.media_type, "image/jpeg");
        assert!(!encoded.data.is_empty());
        assert!(encoded
            .to_data_uri()
            .starts_with("data:image/jpeg;base64,"));

        // The payload decodes back to JPEG magic bytes
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&encoded.data)
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rejects_mismatched_buffer() {
        let frame = Frame {
            width: 10,
            height: 10,
            data: vec![0; 8],
            captured_at: Utc::now(),
        };
        assert!(encode_jpeg(&frame, 80).is_err());
    }
}
