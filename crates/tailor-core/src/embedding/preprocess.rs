//! Image preprocessing for CLIP embedding generation.
//!
//! CLIP ViT-B/32 expects:
//! - Shortest side resized to 224 (bicubic), then a centre 224×224 crop
//! - Channel order: RGB
//! - Per-channel normalization with the OpenAI CLIP mean/std
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel, RGB).
const NORM_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel, RGB).
const NORM_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Preprocess an image for CLIP inference.
///
/// Resizes so the shortest side equals `image_size`, centre-crops to
/// `image_size × image_size`, normalizes per channel, and returns an NCHW
/// tensor suitable for ONNX Runtime.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let cropped = resize_and_center_crop(image, image_size);
    let rgb = cropped.to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    // rgb is exactly size×size after the crop, so every pixel lands in bounds.
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..CHANNELS {
            let val = pixel.0[c] as f32 / 255.0;
            tensor[[0, c, y, x]] = (val - NORM_MEAN[c]) / NORM_STD[c];
        }
    }

    tensor
}

/// Resize the shortest side to `size` and take the centre square.
fn resize_and_center_crop(image: &DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = (image.width().max(1), image.height().max(1));
    let scale = size as f32 / w.min(h) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(size);
    let new_h = ((h as f32 * scale).round() as u32).max(size);

    let resized = image.resize_exact(new_w, new_h, FilterType::CatmullRom);
    let left = (new_w - size) / 2;
    let top = (new_h - size) / 2;
    resized.crop_imm(left, top, size, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_preprocess_shape_landscape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 224);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_shape_portrait_and_tiny() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(300, 900));
        assert_eq!(preprocess(&img, 224).shape(), &[1, 3, 224, 224]);

        let img = DynamicImage::ImageRgb8(RgbImage::new(3, 2));
        assert_eq!(preprocess(&img, 224).shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_normalization_per_channel() {
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, image::Rgb([255, 255, 255])));
        let tensor = preprocess(&img, 224);
        for c in 0..3 {
            let expected = (1.0 - NORM_MEAN[c]) / NORM_STD[c];
            assert!((tensor[[0, c, 100, 100]] - expected).abs() < 0.01);
        }

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, image::Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 224);
        let expected = -NORM_MEAN[0] / NORM_STD[0];
        assert!((tensor[[0, 0, 10, 10]] - expected).abs() < 0.01);
    }

    #[test]
    fn test_center_crop_keeps_middle() {
        // Left third red, middle third green, right third blue.
        let mut img = RgbImage::new(300, 100);
        for (x, _, p) in img.enumerate_pixels_mut() {
            *p = match x {
                0..=99 => image::Rgb([255, 0, 0]),
                100..=199 => image::Rgb([0, 255, 0]),
                _ => image::Rgb([0, 0, 255]),
            };
        }
        let cropped = resize_and_center_crop(&DynamicImage::ImageRgb8(img), 100).to_rgb8();
        assert_eq!(cropped.dimensions(), (100, 100));
        assert_eq!(cropped.get_pixel(50, 50).0, [0, 255, 0]);
    }
}
