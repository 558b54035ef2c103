//! SSD1306 command bytes

pub const DISPLAY_OFF: u8 = 0xAE;
pub const DISPLAY_ON: u8 = 0xAF;
pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
pub const SET_NORMAL: u8 = 0xA6;
pub const SET_CONTRAST: u8 = 0x81;
pub const SET_CHARGE_PUMP: u8 = 0x8D;
pub const SET_MEMORY_MODE: u8 = 0x20;
pub const SET_COLUMN_ADDR: u8 = 0x21;
pub const SET_PAGE_ADDR: u8 = 0x22;
pub const SET_START_LINE: u8 = 0x40;
pub const SET_SEG_REMAP: u8 = 0xA1;
pub const SET_MUX_RATIO: u8 = 0xA8;
pub const SET_COM_SCAN_DEC: u8 = 0xC8;
pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
pub const SET_CLOCK_DIV: u8 = 0xD5;
pub const SET_PRECHARGE: u8 = 0xD9;
pub const SET_COM_PINS: u8 = 0xDA;
pub const SET_VCOM_DETECT: u8 = 0xDB;

/// Charge pump enabled (internal VCC)
pub const CHARGE_PUMP_ON: u8 = 0x14;
/// Horizontal addressing mode
pub const MEMORY_MODE_HORIZONTAL: u8 = 0x00;
/// Pre-charge period for internal VCC
pub const PRECHARGE_INTERNAL: u8 = 0xF1;
/// VCOMH deselect level
pub const VCOM_DESELECT: u8 = 0x40;
