//! Final batch encoding: orientation normalization, JPEG, base64.
//!
//! Runs off the main loop; the app context marshals the finished batch back
//! through its message channel.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::orientation::Rotation;
use crate::session::CapturedImage;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Outcome for a single image in the final batch.
///
/// An image that fails to encode stays in the batch as a `Failed` marker so
/// the host always receives exactly one entry per captured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhotoResult {
    /// Base64 of the quality-80 JPEG bytes.
    Encoded { data: String },
    Failed { error: String },
}

impl PhotoResult {
    pub fn is_encoded(&self) -> bool {
        matches!(self, Self::Encoded { .. })
    }
}

/// Ordered encoding results, one per captured image, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBatch {
    pub photos: Vec<PhotoResult>,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn encoded_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_encoded()).count()
    }
}

/// Rotate pixels captured at the given orientation so they are upright.
pub fn rotate_upright(pixels: &RgbImage, orientation: crate::orientation::DeviceOrientation) -> RgbImage {
    match orientation.upright_rotation() {
        Rotation::None => pixels.clone(),
        Rotation::Cw90 => image::imageops::rotate90(pixels),
        Rotation::Cw180 => image::imageops::rotate180(pixels),
        Rotation::Cw270 => image::imageops::rotate270(pixels),
    }
}

/// Rotate a captured image so its stored orientation tag becomes identity.
pub fn normalize(image: &CapturedImage) -> RgbImage {
    rotate_upright(&image.pixels, image.orientation)
}

/// Encode upright pixels as a quality-80 JPEG and base64 the bytes.
pub fn encode_jpeg_base64(pixels: &RgbImage) -> Result<String, EncodeError> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, config::JPEG_QUALITY);
    encoder.encode_image(pixels)?;
    Ok(B64.encode(&bytes))
}

/// Encode every remaining image, in capture order, with per-image failure
/// markers instead of silent exclusion.
pub fn encode_batch(images: &[CapturedImage]) -> EncodedBatch {
    let photos = images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let upright = normalize(image);
            match encode_jpeg_base64(&upright) {
                Ok(data) => PhotoResult::Encoded { data },
                Err(e) => {
                    log::error!("Failed to encode image {}: {}", index, e);
                    PhotoResult::Failed {
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect();

    EncodedBatch { photos }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::DeviceOrientation;
    use image::Rgb;

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    fn captured(width: u32, height: u32, orientation: DeviceOrientation) -> CapturedImage {
        CapturedImage {
            pixels: solid_image(width, height, [200, 40, 40]),
            orientation,
        }
    }

    #[test]
    fn test_normalize_swaps_dimensions_for_portrait() {
        let image = captured(64, 48, DeviceOrientation::Portrait);
        let upright = normalize(&image);
        assert_eq!((upright.width(), upright.height()), (48, 64));
    }

    #[test]
    fn test_normalize_keeps_landscape_ccw_untouched() {
        let image = captured(64, 48, DeviceOrientation::LandscapeCounterclockwise);
        let upright = normalize(&image);
        assert_eq!((upright.width(), upright.height()), (64, 48));
        assert_eq!(upright, image.pixels);
    }

    #[test]
    fn test_normalize_rotation_direction() {
        // Single white pixel in the top-left corner, rest black.
        let mut pixels = solid_image(4, 2, [0, 0, 0]);
        pixels.put_pixel(0, 0, Rgb([255, 255, 255]));
        let image = CapturedImage {
            pixels,
            orientation: DeviceOrientation::Portrait,
        };

        // 90 degrees clockwise moves the top-left corner to the top-right.
        let upright = normalize(&image);
        assert_eq!(upright.get_pixel(1, 0), &Rgb([255, 255, 255]));
        assert_eq!(upright.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_base64_round_trip_is_upright() {
        let image = captured(40, 30, DeviceOrientation::Portrait);
        let data = encode_jpeg_base64(&normalize(&image)).unwrap();

        let bytes = B64.decode(data).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        // Upright regardless of capture-time orientation
        assert_eq!((decoded.width(), decoded.height()), (30, 40));
        // JPEG is lossy; check the dominant color survived roughly intact
        let px = decoded.get_pixel(15, 20);
        assert!(px[0] > 150 && px[1] < 100 && px[2] < 100);
    }

    #[test]
    fn test_batch_has_one_entry_per_image_in_order() {
        let images = vec![
            captured(8, 6, DeviceOrientation::Portrait),
            captured(10, 6, DeviceOrientation::LandscapeClockwise),
            captured(12, 6, DeviceOrientation::LandscapeCounterclockwise),
        ];
        let batch = encode_batch(&images);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.encoded_count(), 3);

        // Order check via decoded widths (all upright): 6, 10, 12
        let widths: Vec<u32> = batch
            .photos
            .iter()
            .map(|p| match p {
                PhotoResult::Encoded { data } => {
                    let bytes = B64.decode(data).unwrap();
                    image::load_from_memory(&bytes).unwrap().width()
                }
                PhotoResult::Failed { .. } => panic!("unexpected failure"),
            })
            .collect();
        assert_eq!(widths, vec![6, 10, 12]);
    }

    #[test]
    fn test_empty_batch() {
        let batch = encode_batch(&[]);
        assert!(batch.is_empty());
        assert_eq!(batch.encoded_count(), 0);
    }

    #[test]
    fn test_photo_result_serialization() {
        let encoded = PhotoResult::Encoded {
            data: "aGVsbG8=".into(),
        };
        let json = serde_json::to_string(&encoded).unwrap();
        assert!(json.contains("\"status\":\"encoded\""));

        let failed: PhotoResult =
            serde_json::from_str("{\"status\":\"failed\",\"error\":\"boom\"}").unwrap();
        assert!(!failed.is_encoded());
    }
}
