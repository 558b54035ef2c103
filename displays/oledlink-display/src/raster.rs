//! 1-bpp packing and the page/column transpose
//!
//! The panel is mounted rotated a quarter turn against the controller's
//! native addressing, so a frame is built in two steps:
//!
//! 1. pack a binarized image into rows of 8 horizontal pixels per byte
//!    (bit 7 = leftmost), stored bottom-up: source row `y` holds image row
//!    `height - 1 - y`
//! 2. transpose every 8×8 block so each output byte covers 8 vertically
//!    stacked pixels of one page
//!
//! For page `p`, column byte `x` and source bit `k` the output byte index
//! is `p * width + x * 8 + (7 - k)`, and its bit `j` comes from source row
//! `(height - 1) - 8p - j`. In image terms bit `j` of byte `p * width + c`
//! is the pixel at column `c`, row `8p + j`.

use image::{DynamicImage, GrayImage, Luma};

use crate::geometry::PanelGeometry;
use crate::prepare;

/// Pack a binarized image into bottom-up 1-bpp rows
///
/// Any non-zero pixel is lit.
///
/// # Panics
///
/// If the image width is not a multiple of 8.
pub fn pack_rows_bottom_up(image: &GrayImage) -> Vec<u8> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    assert!(width % 8 == 0, "width {} is not a multiple of 8", width);
    let stride = width / 8;
    let mut rows = vec![0u8; stride * height];

    for (col, row, pixel) in image.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let y = height - 1 - row as usize;
        let col = col as usize;
        rows[y * stride + col / 8] |= 0x80 >> (col % 8);
    }

    rows
}

/// Check that `len` bytes hold a whole number of 8×8 blocks
fn check_dimensions(len: usize, width: usize, height: usize) {
    assert!(
        width % 8 == 0 && height % 8 == 0,
        "{}x{} is not a multiple of 8 in both directions",
        width,
        height
    );
    assert_eq!(
        len,
        width / 8 * height,
        "buffer length does not match {}x{}",
        width,
        height
    );
}

/// Convert bottom-up 1-bpp rows into page-addressed panel bytes
///
/// # Panics
///
/// If `width` or `height` is not a multiple of 8, or `pixels` is not
/// `width / 8 * height` bytes.
pub fn transpose(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    check_dimensions(pixels.len(), width, height);
    let stride = width / 8;
    let pages = height / 8;
    let mut out = vec![0u8; stride * height];

    for p in 0..pages {
        for x in 0..stride {
            for k in (0..8).rev() {
                let n = p * width + x * 8 + (7 - k);
                let top = height - 1 - 8 * p;
                for j in 0..8 {
                    let y = top - j;
                    if pixels[y * stride + x] & (1 << k) != 0 {
                        out[n] |= 1 << j;
                    }
                }
            }
        }
    }

    out
}

/// Inverse of [`transpose`]
///
/// # Panics
///
/// Under the same conditions as [`transpose`].
pub fn untranspose(frame: &[u8], width: usize, height: usize) -> Vec<u8> {
    check_dimensions(frame.len(), width, height);
    let stride = width / 8;
    let pages = height / 8;
    let mut rows = vec![0u8; stride * height];

    for p in 0..pages {
        for x in 0..stride {
            for k in (0..8).rev() {
                let byte = frame[p * width + x * 8 + (7 - k)];
                let top = height - 1 - 8 * p;
                for j in 0..8 {
                    if byte & (1 << j) != 0 {
                        rows[(top - j) * stride + x] |= 1 << k;
                    }
                }
            }
        }
    }

    rows
}

/// Complement every byte in place
pub fn invert(bytes: &mut [u8]) {
    for byte in bytes.iter_mut() {
        *byte = 255 - *byte;
    }
}

/// Page-addressed frame ready for the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u8,
    height: u8,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    /// Frame with every byte set to `value`
    pub fn filled(geometry: &PanelGeometry, value: u8) -> Self {
        Self {
            width: geometry.width(),
            height: geometry.height(),
            bytes: vec![value; geometry.buffer_len()],
        }
    }

    /// Run an arbitrary image through the full pipeline
    pub fn from_image(image: &DynamicImage, geometry: &PanelGeometry, invert: bool) -> Self {
        let width = geometry.width();
        let height = geometry.height();

        let mono = prepare::prepare(image, u32::from(width), u32::from(height));
        let rows = pack_rows_bottom_up(&mono);
        let bytes = transpose(&rows, usize::from(width), usize::from(height));

        let mut frame = Self {
            width,
            height,
            bytes,
        };
        if invert {
            frame.invert();
        }
        frame
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Complement every byte
    pub fn invert(&mut self) {
        invert(&mut self.bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Recover the bottom-up 1-bpp rows this frame was built from
    pub fn to_rows_bottom_up(&self) -> Vec<u8> {
        untranspose(
            &self.bytes,
            usize::from(self.width),
            usize::from(self.height),
        )
    }

    /// Render the frame as it would appear on the glass (lit = 255)
    pub fn to_image(&self) -> GrayImage {
        let width = usize::from(self.width);
        let height = usize::from(self.height);
        let stride = width / 8;
        let rows = self.to_rows_bottom_up();

        GrayImage::from_fn(u32::from(self.width), u32::from(self.height), |col, row| {
            let y = height - 1 - row as usize;
            let col = col as usize;
            if rows[y * stride + col / 8] & (0x80 >> (col % 8)) != 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}
