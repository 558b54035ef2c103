//! Panel geometry presets
//!
//! SSD1306 glass comes in a handful of sizes. Each needs its own multiplex
//! ratio, clock divider and COM pin configuration, and narrower panels are
//! wired to the middle of the 128 column drivers.

use thiserror::Error;

/// Supported (width, height) pairs
pub const PRESETS: [(u8, u8); 5] = [(128, 64), (128, 32), (96, 16), (64, 48), (64, 32)];

/// Number of column drivers on the controller
const CONTROLLER_COLUMNS: u8 = 0x80;

/// Panel size outside [`PRESETS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported display mode: {width} x {height}")]
pub struct UnsupportedGeometry {
    pub width: u8,
    pub height: u8,
}

/// Mounting orientation of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    /// Parse a rotation in degrees
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Orientation::Deg0),
            90 => Some(Orientation::Deg90),
            180 => Some(Orientation::Deg180),
            270 => Some(Orientation::Deg270),
            _ => None,
        }
    }

    /// Rotation in degrees
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }
}

/// Size-dependent register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSettings {
    /// Multiplex ratio (rows - 1)
    pub multiplex: u8,
    /// Display clock divide ratio / oscillator frequency
    pub display_clock_div: u8,
    /// COM pins hardware configuration
    pub com_pins: u8,
}

impl PanelSettings {
    /// Register values for a supported size
    pub fn lookup(width: u8, height: u8) -> Option<Self> {
        let (multiplex, display_clock_div, com_pins) = match (width, height) {
            (128, 64) => (0x3F, 0x80, 0x12),
            (128, 32) => (0x1F, 0x80, 0x02),
            (96, 16) => (0x0F, 0x60, 0x02),
            (64, 48) => (0x2F, 0x80, 0x12),
            (64, 32) => (0x1F, 0x80, 0x12),
            _ => return None,
        };

        Some(Self {
            multiplex,
            display_clock_div,
            com_pins,
        })
    }
}

/// Validated panel geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    width: u8,
    height: u8,
    orientation: Orientation,
    settings: PanelSettings,
}

impl PanelGeometry {
    /// Validate a panel size against [`PRESETS`]
    pub fn new(
        width: u8,
        height: u8,
        orientation: Orientation,
    ) -> Result<Self, UnsupportedGeometry> {
        let settings =
            PanelSettings::lookup(width, height).ok_or(UnsupportedGeometry { width, height })?;

        Ok(Self {
            width,
            height,
            orientation,
            settings,
        })
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    /// Number of 8-row pages
    pub fn pages(&self) -> u8 {
        self.height / 8
    }

    /// First controller column wired to the glass
    pub fn col_start(&self) -> u8 {
        (CONTROLLER_COLUMNS - self.width) / 2
    }

    /// One past the last controller column wired to the glass
    pub fn col_end(&self) -> u8 {
        self.col_start() + self.width
    }

    /// Frame buffer length in bytes
    pub fn buffer_len(&self) -> usize {
        usize::from(self.width) / 8 * usize::from(self.height)
    }
}
