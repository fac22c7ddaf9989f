//! Upload decoding with format detection, validation, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::DecodeError;

/// Image decoder with configurable limits and timeout.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.limits.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Decode an uploaded image from memory with validation and timeout.
    ///
    /// `name` is the client-supplied file name; it is used for error messages
    /// and as a format hint when content sniffing fails.
    pub async fn decode_bytes(
        &self,
        bytes: Vec<u8>,
        name: &str,
    ) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty {
                name: name.to_string(),
            });
        }
        if bytes.len() > self.max_upload_bytes() {
            return Err(DecodeError::FileTooLarge {
                name: name.to_string(),
                size_bytes: bytes.len() as u64,
                max_mb: self.limits.max_upload_mb,
            });
        }

        let name_owned = name.to_string();
        let max_dim = self.limits.max_image_dimension;
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || {
                Self::decode_bytes_sync(bytes, &name_owned, max_dim)
            })
            .await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                tracing::debug!(
                    "Decoded {} ({}x{}, {:?})",
                    name,
                    decoded.width,
                    decoded.height,
                    decoded.format
                );
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(DecodeError::Decode {
                name: name.to_string(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(DecodeError::Timeout {
                name: name.to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Read and decode an image file from disk.
    pub async fn decode_file(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let name = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DecodeError::Decode {
                name: name.clone(),
                message: e.to_string(),
            })?;
        self.decode_bytes(bytes, &name).await
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    ///
    /// Dimensions are read from the header and checked against `max_dim`
    /// before any pixel buffer is allocated.
    fn decode_bytes_sync(
        bytes: Vec<u8>,
        name: &str,
        max_dim: u32,
    ) -> Result<DecodedImage, DecodeError> {
        use std::io::Cursor;

        let decode_error = |e: image::ImageError| DecodeError::Decode {
            name: name.to_string(),
            message: e.to_string(),
        };

        let mut reader = image::ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| DecodeError::Decode {
                name: name.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(name).map_err(|_| DecodeError::UnsupportedFormat {
                name: name.to_string(),
                format: Path::new(name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?,
        };
        reader.set_format(format);

        let (width, height) = image::ImageReader::with_format(Cursor::new(bytes.as_slice()), format)
            .into_dimensions()
            .map_err(decode_error)?;
        if width > max_dim || height > max_dim {
            return Err(DecodeError::ImageTooLarge {
                name: name.to_string(),
                width,
                height,
                max_dim,
            });
        }

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(max_dim);
        limits.max_image_height = Some(max_dim);
        reader.limits(limits);

        let image = reader.decode().map_err(decode_error)?;
        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default())
    }

    #[tokio::test]
    async fn test_decode_png_bytes() {
        let decoded = decoder()
            .decode_bytes(png_bytes(40, 30), "upload.png")
            .await
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (40, 30));
    }

    #[tokio::test]
    async fn test_format_detected_by_content_not_name() {
        let decoded = decoder()
            .decode_bytes(png_bytes(8, 8), "photo.jpg")
            .await
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_rejects_empty_upload() {
        let err = decoder().decode_bytes(Vec::new(), "x.png").await.err().unwrap();
        assert!(matches!(err, DecodeError::Empty { .. }));
    }

    #[tokio::test]
    async fn test_rejects_garbage_bytes() {
        let err = decoder()
            .decode_bytes(b"definitely not an image".to_vec(), "notes.txt")
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DecodeError::UnsupportedFormat { .. } | DecodeError::Decode { .. }
        ));
    }

    #[tokio::test]
    async fn test_rejects_oversized_dimensions() {
        let limits = LimitsConfig {
            max_image_dimension: 16,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits)
            .decode_bytes(png_bytes(32, 8), "wide.png")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DecodeError::ImageTooLarge { width: 32, .. }));
    }

    /// 24-bit BMP header declaring `width` x `height` with no pixel data.
    fn bmp_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(54);
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&(width as i32).to_le_bytes());
        bytes.extend_from_slice(&(height as i32).to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 24]);
        bytes
    }

    #[test]
    fn test_oversized_header_rejected_before_decoding_pixels() {
        let err = ImageDecoder::decode_bytes_sync(bmp_header(60_000, 60_000), "bomb.bmp", 10_000)
            .err()
            .unwrap();
        assert!(
            matches!(
                err,
                DecodeError::ImageTooLarge {
                    width: 60_000,
                    height: 60_000,
                    max_dim: 10_000,
                    ..
                }
            ),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let limits = LimitsConfig {
            max_upload_mb: 1,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits)
            .decode_bytes(vec![0u8; 1024 * 1024 + 1], "big.png")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DecodeError::FileTooLarge { max_mb: 1, .. }));
    }

    #[tokio::test]
    async fn test_decode_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        std::fs::write(&path, png_bytes(5, 7)).unwrap();

        let decoded = decoder().decode_file(&path).await.unwrap();
        assert_eq!((decoded.width, decoded.height), (5, 7));

        let missing = decoder().decode_file(&dir.path().join("nope.png")).await;
        assert!(missing.is_err());
    }
}
