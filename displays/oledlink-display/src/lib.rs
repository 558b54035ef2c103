//! SSD1306 panel controller and image pipeline
//!
//! This crate provides:
//! - [`Ssd1306`]: register-level initialization and display primitives on
//!   top of any [`oledlink_hal::Transport`]
//! - [`PanelGeometry`]: the five supported panel sizes and their register
//!   settings
//! - [`FrameBuffer`]: conversion of arbitrary images into the page-addressed
//!   layout the controller expects
//!
//! # Pipeline
//!
//! ```text
//! image ──► scale to fit + dither ──► 1-bpp rows ──► page transpose ──► panel
//!           (only if too large)       (bottom-up)     (+ optional invert)
//! ```

pub mod command;
pub mod geometry;
pub mod prepare;
pub mod raster;
pub mod ssd1306;

// Re-export key types
pub use geometry::{Orientation, PanelGeometry, PanelSettings, UnsupportedGeometry, PRESETS};
pub use raster::FrameBuffer;
pub use ssd1306::{PanelError, Ssd1306, DEFAULT_CONTRAST};
