use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use vp_core::ports::{CaptureOptions, EncodeError, FrameEncoderPort, VideoFrame};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Off-screen still rendering with the `image` crate.
///
/// Flash fills the buffer white before the frame is drawn over it; mirroring
/// flips horizontally to match the preview.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFrameEncoder;

impl ImageFrameEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameEncoderPort for ImageFrameEncoder {
    fn encode_frame(
        &self,
        frame: &VideoFrame,
        options: CaptureOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        let malformed = || EncodeError::MalformedFrame {
            width: frame.width,
            height: frame.height,
        };
        if !frame.is_well_formed() {
            return Err(malformed());
        }
        let captured = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
            .ok_or_else(malformed)?;

        let mut canvas = if options.flash {
            let mut lit = RgbaImage::from_pixel(frame.width, frame.height, WHITE);
            imageops::overlay(&mut lit, &captured, 0, 0);
            lit
        } else {
            captured
        };
        if options.mirror {
            imageops::flip_horizontal_in_place(&mut canvas);
        }

        let jpeg = encode_jpeg(DynamicImage::ImageRgba8(canvas), options.jpeg_quality)?;
        debug!(
            width = frame.width,
            height = frame.height,
            mirror = options.mirror,
            flash = options.flash,
            bytes = jpeg.len(),
            "frame encoded"
        );
        Ok(jpeg)
    }

    fn normalize_image(&self, bytes: &[u8], jpeg_quality: u8) -> Result<Vec<u8>, EncodeError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|err| EncodeError::Decode(err.to_string()))?;
        encode_jpeg(decoded, jpeg_quality)
    }
}

fn encode_jpeg(image: DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    // JPEG has no alpha channel
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb8.into())
        .map_err(|err| EncodeError::Encode(err.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    /// Left half red, right half blue.
    fn split_frame(width: u32, height: u32) -> VideoFrame {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(if x < width / 2 { &RED } else { &BLUE });
            }
        }
        VideoFrame {
            width,
            height,
            rgba,
        }
    }

    fn options(mirror: bool, flash: bool) -> CaptureOptions {
        CaptureOptions {
            mirror,
            flash,
            jpeg_quality: 90,
        }
    }

    #[test]
    fn mirrored_capture_swaps_left_and_right() {
        let jpeg = ImageFrameEncoder
            .encode_frame(&split_frame(32, 16), options(true, false))
            .unwrap();

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (32, 16));
        let left = decoded.get_pixel(3, 8);
        let right = decoded.get_pixel(28, 8);
        assert!(left[2] > 200 && left[0] < 60, "left should be blue: {left:?}");
        assert!(right[0] > 200 && right[2] < 60, "right should be red: {right:?}");
    }

    #[test]
    fn flash_shows_white_through_transparent_pixels() {
        let frame = VideoFrame {
            width: 16,
            height: 16,
            rgba: vec![0; 16 * 16 * 4],
        };

        let lit = ImageFrameEncoder
            .encode_frame(&frame, options(false, true))
            .unwrap();
        let dark = ImageFrameEncoder
            .encode_frame(&frame, options(false, false))
            .unwrap();

        let lit_pixel = image::load_from_memory(&lit).unwrap().get_pixel(8, 8);
        let dark_pixel = image::load_from_memory(&dark).unwrap().get_pixel(8, 8);
        assert!(lit_pixel[0] > 240 && lit_pixel[1] > 240 && lit_pixel[2] > 240);
        assert!(dark_pixel[0] < 15);
    }

    #[test]
    fn malformed_frame_is_rejected() {
        let frame = VideoFrame {
            width: 4,
            height: 4,
            rgba: vec![0; 10],
        };
        let err = ImageFrameEncoder
            .encode_frame(&frame, options(true, true))
            .unwrap_err();
        assert_eq!(err, EncodeError::MalformedFrame { width: 4, height: 4 });
    }

    #[test]
    fn selected_png_is_reencoded_as_jpeg() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(image::RgbImage::new(20, 10))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let jpeg = ImageFrameEncoder.normalize_image(&png, 80).unwrap();

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(image::load_from_memory(&jpeg).unwrap().dimensions(), (20, 10));
    }

    #[test]
    fn non_image_file_is_a_decode_error() {
        let err = ImageFrameEncoder
            .normalize_image(b"definitely not an image", 80)
            .unwrap_err();
        assert!(matches!(err, EncodeError::Decode(_)));
    }
}
