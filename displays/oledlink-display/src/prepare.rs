//! Scale, center and binarize images for a monochrome panel
//!
//! Images larger than the panel are scaled down to fit, letterboxed on a
//! black canvas and error-diffusion dithered. Images that already fit are
//! centered unscaled and thresholded.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

/// Luminance at or above this is lit
pub const THRESHOLD: i32 = 135;

/// Error divisor of the diffusion kernel (weights 7, 3, 5, 1)
const DIFFUSION_DIVISOR: f32 = 23.0;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Rec. 709 luminance, each channel term truncated separately
pub fn luminance(pixel: &Rgba<u8>) -> i32 {
    let [r, g, b, _] = pixel.0;
    i32::from((0.2126 * f32::from(r)) as u8)
        + i32::from((0.7152 * f32::from(g)) as u8)
        + i32::from((0.0722 * f32::from(b)) as u8)
}

/// Scale `image` down to fit `width` × `height`, centered on black
pub fn scale_to_fit(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let scale = f64::min(
        f64::from(width) / f64::from(image.width()),
        f64::from(height) / f64::from(image.height()),
    );
    let scaled_width = ((f64::from(image.width()) * scale) as u32).clamp(1, width);
    let scaled_height = ((f64::from(image.height()) * scale) as u32).clamp(1, height);

    let scaled = imageops::resize(image, scaled_width, scaled_height, FilterType::Triangle);
    center(&scaled, width, height)
}

/// Place `image` centered on a black `width` × `height` canvas
///
/// Parts that do not fit are cropped.
pub fn center(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, BLACK);
    let x = (i64::from(width) - i64::from(image.width())) / 2;
    let y = (i64::from(height) - i64::from(image.height())) / 2;
    imageops::replace(&mut canvas, image, x, y);
    canvas
}

/// Binarize without error diffusion
pub fn threshold(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if luminance(image.get_pixel(x, y)) < THRESHOLD {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Binarize with error diffusion
pub fn dither(image: &RgbaImage) -> GrayImage {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let luma: Vec<i32> = image.pixels().map(luminance).collect();

    let out = dither_luma(luma, width, height);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([out[y as usize * width + x as usize]])
    })
}

/// Dither a row-major luminance buffer into 0/255 values
///
/// Increments are truncated toward zero. Neighbours outside the image,
/// including past the end of a row, are dropped.
fn dither_luma(mut luma: Vec<i32>, width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = luma[i];
            let new = if old < THRESHOLD { 0 } else { 255 };
            out[i] = new as u8;

            let err = (old - new) as f32 / DIFFUSION_DIVISOR;
            if err == 0.0 {
                continue;
            }

            let right = x + 1 < width;
            if right {
                luma[i + 1] += (err * 7.0) as i32;
            }
            if y + 1 < height {
                let below = i + width;
                if x > 0 {
                    luma[below - 1] += (err * 3.0) as i32;
                }
                luma[below] += (err * 5.0) as i32;
                if right {
                    luma[below + 1] += (err * 1.0) as i32;
                }
            }
        }
    }

    out
}

/// Produce a `width` × `height` monochrome image (0 or 255 per pixel)
pub fn prepare(image: &DynamicImage, width: u32, height: u32) -> GrayImage {
    let rgba = image.to_rgba8();

    if rgba.width() > width || rgba.height() > height {
        log::debug!(
            "scaling {}x{} image to fit {}x{}",
            rgba.width(),
            rgba.height(),
            width,
            height
        );
        dither(&scale_to_fit(&rgba, width, height))
    } else {
        threshold(&center(&rgba, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_luminance_truncates_per_channel() {
        assert_eq!(luminance(&WHITE), 54 + 182 + 18);
        assert_eq!(luminance(&BLACK), 0);
        assert_eq!(luminance(&Rgba([0, 255, 0, 255])), 182);
    }

    #[test]
    fn test_dither_threshold_boundary() {
        assert_eq!(dither_luma(vec![134], 1, 1), vec![0]);
        assert_eq!(dither_luma(vec![135], 1, 1), vec![255]);
    }

    #[test]
    fn test_dither_diffuses_to_the_right() {
        // 134 -> 0, error 134/23 * 7 = 40 pushes the neighbour over
        assert_eq!(dither_luma(vec![134, 134], 2, 1), vec![0, 255]);
    }

    #[test]
    fn test_dither_does_not_wrap_rows() {
        // The error of (1, 0) must not reach (0, 1) as a right neighbour
        let out = dither_luma(vec![0, 134, 100, 0], 2, 2);
        assert_eq!(out, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_dither_solid_images() {
        let white = RgbaImage::from_pixel(8, 4, WHITE);
        assert!(dither(&white).pixels().all(|p| p[0] == 255));

        let black = RgbaImage::from_pixel(8, 4, BLACK);
        assert!(dither(&black).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_scale_letterboxes_wide_image() {
        let wide = RgbaImage::from_pixel(256, 64, WHITE);
        let fitted = scale_to_fit(&wide, 128, 64);

        assert_eq!(fitted.dimensions(), (128, 64));
        assert_eq!(*fitted.get_pixel(64, 15), BLACK);
        assert!(luminance(fitted.get_pixel(0, 16)) >= THRESHOLD);
        assert!(luminance(fitted.get_pixel(127, 47)) >= THRESHOLD);
        assert_eq!(*fitted.get_pixel(64, 48), BLACK);
    }

    #[test]
    fn test_scale_pillarboxes_tall_image() {
        let tall = RgbaImage::from_pixel(32, 128, WHITE);
        let fitted = scale_to_fit(&tall, 128, 64);

        // 16 wide, centered at column 56
        assert_eq!(*fitted.get_pixel(55, 32), BLACK);
        assert!(luminance(fitted.get_pixel(56, 32)) >= THRESHOLD);
        assert!(luminance(fitted.get_pixel(71, 32)) >= THRESHOLD);
        assert_eq!(*fitted.get_pixel(72, 32), BLACK);
    }

    #[test]
    fn test_small_image_is_centered_not_scaled() {
        let small = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, WHITE));
        let mono = prepare(&small, 128, 64);

        assert_eq!(mono.dimensions(), (128, 64));
        let lit: Vec<(u32, u32)> = mono
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit, vec![(63, 31), (64, 31), (63, 32), (64, 32)]);
    }

    #[test]
    fn test_large_image_output_is_binary() {
        let gradient = RgbaImage::from_fn(300, 100, |x, _| {
            let v = (x % 256) as u8;
            Rgba([v, v, v, 255])
        });
        let mono = prepare(&DynamicImage::ImageRgba8(gradient), 128, 32);

        assert_eq!(mono.dimensions(), (128, 32));
        assert!(mono.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
}
