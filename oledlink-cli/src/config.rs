//! Tool configuration
//!
//! Loaded from a TOML file. A missing file yields the built-in defaults
//! (128×64 panel at 0x3C behind a USB bridge).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{anyhow, Context};
use log::{debug, info};
use oledlink_display::{Orientation, PanelGeometry};
use serde::Deserialize;

/// Default configuration file name
pub const DEFAULT_PATH: &str = "oledlink.toml";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub panel: PanelConfig,
    pub transport: TransportConfig,
}

/// Panel geometry and appearance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    pub width: u8,
    pub height: u8,
    /// Rotation in degrees (0, 90, 180, 270)
    pub orientation: u16,
    /// Applied after initialization when set
    pub contrast: Option<u8>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            orientation: 0,
            contrast: None,
        }
    }
}

impl PanelConfig {
    /// Validate against the supported panel sizes
    pub fn geometry(&self) -> anyhow::Result<PanelGeometry> {
        let orientation = Orientation::from_degrees(self.orientation)
            .ok_or_else(|| anyhow!("invalid orientation {}", self.orientation))?;
        Ok(PanelGeometry::new(self.width, self.height, orientation)?)
    }
}

/// Which bridge the panel sits behind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Usb,
    Uart,
}

/// Transport selection and link settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub kind: TransportKind,
    /// I2C address of the panel
    pub address: u8,
    /// USB: poll status after bulk writes
    pub strict_writes: bool,
    /// USB: I2C clock delay programmed before first use
    pub i2c_delay_us: Option<i16>,
    /// USB: control transfer timeout
    pub timeout_ms: u64,
    /// UART: preferred port
    pub port: String,
    /// UART: line rate
    pub baud_rate: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Usb,
            address: 0x3C,
            strict_writes: false,
            i2c_delay_us: None,
            timeout_ms: 1000,
            port: String::from("/dev/ttyUSB0"),
            baud_rate: 115_200,
        }
    }
}

impl Config {
    /// Parse a TOML document
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let config =
            Self::parse(&text).with_context(|| format!("failed to load {}", path.display()))?;
        info!(
            "loaded {}: {}x{} panel over {:?}",
            path.display(),
            config.panel.width,
            config.panel.height,
            config.transport.kind
        );
        Ok(config)
    }
}
