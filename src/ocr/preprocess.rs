use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, Rgba};
use imageproc::contrast::{ThresholdType, otsu_level, threshold_mut};

use super::text::BoundingBox;
use crate::config::RelativeRect;

/// Size multiplier applied when `upscale` is on.
const UPSCALE_FACTOR: u32 = 2;

/// Image cleanup applied before recognition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreprocessOptions {
    /// Multiplier applied to every gray level, saturating at 255
    pub contrast: f32,
    /// Double the image size; small table fonts recognize better
    pub upscale: bool,
    /// Flip black and white after binarization (light text on dark UI)
    pub invert: bool,
    pub crop: Option<RelativeRect>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            contrast: 1.5,
            upscale: true,
            invert: false,
            crop: None,
        }
    }
}

/// Maps pixel positions in the preprocessed image back onto the original
/// screenshot, undoing the upscale and the crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceMapping {
    pub offset_x: i32,
    pub offset_y: i32,
    pub scale: i32,
}

impl Default for SourceMapping {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            scale: 1,
        }
    }
}

impl SourceMapping {
    pub fn to_source(&self, bbox: BoundingBox) -> BoundingBox {
        let x = |v: i32| v.div_euclid(self.scale) + self.offset_x;
        let y = |v: i32| v.div_euclid(self.scale) + self.offset_y;
        BoundingBox::new(x(bbox.x0), y(bbox.y0), x(bbox.x1), y(bbox.y1))
    }
}

/// Decodes a PNG/JPEG screenshot and turns it into a clean binary image.
///
/// Steps: optional crop, grayscale, contrast stretch, optional 2x upscale,
/// Otsu binarization. The returned mapping converts positions in the result
/// back to screenshot pixels.
pub fn preprocess_image(
    bytes: &[u8],
    opts: &PreprocessOptions,
) -> Result<(GrayImage, SourceMapping)> {
    let img = image::load_from_memory(bytes)
        .context("Unable to decode image")?
        .to_rgba8();

    let mut mapping = SourceMapping::default();
    let img = match &opts.crop {
        Some(region) => {
            let (x0, y0, _, _) = crop_bounds(img.dimensions(), region);
            mapping.offset_x = x0 as i32;
            mapping.offset_y = y0 as i32;
            crop_region(&img, region)
        }
        None => img,
    };

    let gray = scale_contrast(&imageops::grayscale(&img), opts.contrast);

    let mut binary = if opts.upscale {
        let (w, h) = gray.dimensions();
        mapping.scale = UPSCALE_FACTOR as i32;
        imageops::resize(
            &gray,
            w * UPSCALE_FACTOR,
            h * UPSCALE_FACTOR,
            FilterType::CatmullRom,
        )
    } else {
        gray
    };

    let level = otsu_level(&binary);
    threshold_mut(&mut binary, level, ThresholdType::Binary);

    if opts.invert {
        imageops::invert(&mut binary);
    }

    Ok((binary, mapping))
}

/// Multiplies every pixel by `alpha`, clamping to 0..=255.
pub fn scale_contrast(img: &GrayImage, alpha: f32) -> GrayImage {
    let mut output: GrayImage = ImageBuffer::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = (pixel[0] as f32 * alpha).round().clamp(0.0, 255.0) as u8;
        output.put_pixel(x, y, Luma([value]));
    }
    output
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect (0.0–1.0) to absolute pixel coordinates,
/// clamps to image bounds, and returns the cropped sub-image.
pub fn crop_region(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    region: &RelativeRect,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let (x0, y0, rw, rh) = crop_bounds(img.dimensions(), region);
    imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}

/// Absolute `(x, y, width, height)` of `region`, clamped to the image.
fn crop_bounds((w, h): (u32, u32), region: &RelativeRect) -> (u32, u32, u32, u32) {
    let x0 = ((region.x * w as f32) as u32).min(w);
    let y0 = ((region.y * h as f32) as u32).min(h);
    let rw = ((region.width * w as f32) as u32).min(w - x0);
    let rh = ((region.height * h as f32) as u32).min(h - y0);
    (x0, y0, rw, rh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn encode_png(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_crop_region() {
        // 100x200 image
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(100, 200, |x, y| Rgba([x as u8, y as u8, 0, 255]));

        let region = RelativeRect { x: 0.1, y: 0.25, width: 0.5, height: 0.1 };
        let cropped = crop_region(&img, &region);

        assert_eq!(cropped.dimensions(), (50, 20));
        // Top-left pixel should be (10, 50) from original
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
        assert_eq!(cropped.get_pixel(0, 0)[1], 50);
    }

    #[test]
    fn test_crop_region_clamps() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(100, 100);
        let region = RelativeRect { x: 0.9, y: 0.9, width: 0.5, height: 0.5 };
        let cropped = crop_region(&img, &region);

        // Should clamp to 10x10 (remaining pixels)
        assert_eq!(cropped.dimensions(), (10, 10));
    }

    #[test]
    fn test_scale_contrast_saturates() {
        let img: GrayImage = ImageBuffer::from_fn(3, 1, |x, _| Luma([[10, 100, 200][x as usize]]));
        let out = scale_contrast(&img, 1.5);
        assert_eq!(out.get_pixel(0, 0)[0], 15);
        assert_eq!(out.get_pixel(1, 0)[0], 150);
        assert_eq!(out.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_preprocess_binarizes_and_upscales() {
        // Left half dark, right half bright
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(8, 4, |x, _| {
            if x < 4 { Rgba([30, 30, 30, 255]) } else { Rgba([220, 220, 220, 255]) }
        });
        let (out, mapping) =
            preprocess_image(&encode_png(&img), &PreprocessOptions::default()).unwrap();

        assert_eq!(out.dimensions(), (16, 8));
        assert_eq!(mapping.scale, 2);
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(15, 7)[0], 255);
    }

    #[test]
    fn test_preprocess_invert() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(8, 4, |x, _| {
            if x < 4 { Rgba([30, 30, 30, 255]) } else { Rgba([220, 220, 220, 255]) }
        });
        let opts = PreprocessOptions {
            upscale: false,
            invert: true,
            ..PreprocessOptions::default()
        };
        let (out, mapping) = preprocess_image(&encode_png(&img), &opts).unwrap();
        assert_eq!(mapping, SourceMapping::default());
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(7, 0)[0], 0);
    }

    #[test]
    fn test_mapping_undoes_crop_and_upscale() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(200, 100, Rgba([200, 200, 200, 255]));
        let opts = PreprocessOptions {
            crop: Some(RelativeRect { x: 0.5, y: 0.2, width: 0.5, height: 0.5 }),
            ..PreprocessOptions::default()
        };
        let (out, mapping) = preprocess_image(&encode_png(&img), &opts).unwrap();

        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(
            mapping,
            SourceMapping {
                offset_x: 100,
                offset_y: 20,
                scale: 2
            }
        );
        assert_eq!(
            mapping.to_source(BoundingBox::new(0, 10, 41, 30)),
            BoundingBox::new(100, 25, 120, 35)
        );
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        assert!(preprocess_image(b"not an image", &PreprocessOptions::default()).is_err());
    }
}
