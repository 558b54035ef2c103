//! Frame encoding and decoding for the UART bridge protocol.
//!
//! Frame format:
//! - ADDRESS (1 byte): 7-bit I2C address the bridge starts a write to
//! - SIZE (2 bytes, big-endian): payload length + 1
//! - CONTROL (1 byte): 0x00 for commands, 0x40 for display RAM data
//! - PAYLOAD (SIZE - 1 bytes)
//!
//! The bridge writes SIZE bytes to the bus after the address, starting with
//! the control byte. There is no start marker and no checksum; a receiver
//! that loses sync stays out of sync until the stream realigns.

use heapless::Vec;

/// Header length: address, two size bytes, control byte
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 16-bit size field can describe
pub const MAX_WIRE_PAYLOAD: usize = u16::MAX as usize - 1;

/// Largest payload buffered by [`FrameParser`] and [`Frame::encode_to_vec`]
///
/// One full 128x64 framebuffer.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Largest frame produced by [`Frame::encode_to_vec`]
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// SSD1306 control byte selecting how the following bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Control {
    /// Bytes are controller commands
    Command = 0x00,
    /// Bytes go to display RAM
    Data = 0x40,
}

impl Control {
    /// Raw control byte
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Parse a raw control byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Control::Command),
            0x40 => Some(Control::Data),
            _ => None,
        }
    }
}

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Invalid frame structure
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A frame ready to be written to the UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// I2C address of the panel behind the bridge
    pub address: u8,
    /// Command or data
    pub control: Control,
    /// Bytes following the control byte
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Create a new frame, checking the payload fits the size field
    pub fn new(address: u8, control: Control, payload: &'a [u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_WIRE_PAYLOAD {
            return Err(FrameError::PayloadTooLarge);
        }

        Ok(Self {
            address,
            control,
            payload,
        })
    }

    /// Create a command frame
    pub fn command(address: u8, payload: &'a [u8]) -> Result<Self, FrameError> {
        Self::new(address, Control::Command, payload)
    }

    /// Create a data frame
    pub fn data(address: u8, payload: &'a [u8]) -> Result<Self, FrameError> {
        Self::new(address, Control::Data, payload)
    }

    /// Value of the SIZE field: payload plus the control byte
    pub fn size(&self) -> u16 {
        (self.payload.len() + 1) as u16
    }

    /// The four header bytes
    pub fn header(&self) -> [u8; HEADER_SIZE] {
        let [hi, lo] = self.size().to_be_bytes();
        [self.address, hi, lo, self.control.byte()]
    }

    /// Total encoded length
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[..HEADER_SIZE].copy_from_slice(&self.header());
        buffer[HEADER_SIZE..frame_len].copy_from_slice(self.payload);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut vec = Vec::new();
        vec.extend_from_slice(&self.header())
            .map_err(|_| FrameError::BufferTooSmall)?;
        vec.extend_from_slice(self.payload)
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// A frame reassembled by [`FrameParser`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    /// I2C address the bridge would start a write to
    pub address: u8,
    /// Raw control byte (the first byte written to the bus)
    pub control: u8,
    /// Bytes following the control byte
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl ParsedFrame {
    /// Control byte as a known [`Control`] value
    pub fn kind(&self) -> Option<Control> {
        Control::from_byte(self.control)
    }
}

/// State machine for parsing incoming frames
///
/// Follows the bridge firmware: the first byte is the address, the next two
/// the big-endian size, then exactly `size` bytes are relayed.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    address: u8,
    size: u16,
    control: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for ADDRESS
    WaitingForAddress,
    /// Got ADDRESS, waiting for SIZE high byte
    WaitingForSizeHigh,
    /// Waiting for SIZE low byte
    WaitingForSizeLow,
    /// Waiting for CONTROL
    WaitingForControl,
    /// Reading payload bytes
    ReadingPayload,
    /// Discarding the body of an oversized frame
    Skipping { remaining: u16 },
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForAddress,
            buffer: Vec::new(),
            address: 0,
            size: 0,
            control: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForAddress;
        self.buffer.clear();
        self.address = 0;
        self.size = 0;
        self.control = 0;
    }

    /// True when no frame is partially received
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::WaitingForAddress
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// An oversized frame reports `PayloadTooLarge` as soon as its size is
    /// known; its body is then skipped so the next frame still parses.
    pub fn feed(&mut self, byte: u8) -> Result<Option<ParsedFrame>, FrameError> {
        match self.state {
            ParseState::WaitingForAddress => {
                self.address = byte;
                self.state = ParseState::WaitingForSizeHigh;
                Ok(None)
            }
            ParseState::WaitingForSizeHigh => {
                self.size = u16::from(byte) << 8;
                self.state = ParseState::WaitingForSizeLow;
                Ok(None)
            }
            ParseState::WaitingForSizeLow => {
                self.size |= u16::from(byte);
                if self.size == 0 {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                if usize::from(self.size - 1) > MAX_PAYLOAD_SIZE {
                    let remaining = self.size;
                    self.reset();
                    self.state = ParseState::Skipping { remaining };
                    return Err(FrameError::PayloadTooLarge);
                }
                self.state = ParseState::WaitingForControl;
                Ok(None)
            }
            ParseState::WaitingForControl => {
                self.control = byte;
                self.buffer.clear();
                if self.size == 1 {
                    return Ok(Some(self.finish()));
                }
                self.state = ParseState::ReadingPayload;
                Ok(None)
            }
            ParseState::ReadingPayload => {
                if self.buffer.push(byte).is_err() {
                    self.reset();
                    return Err(FrameError::PayloadTooLarge);
                }
                if self.buffer.len() == usize::from(self.size - 1) {
                    return Ok(Some(self.finish()));
                }
                Ok(None)
            }
            ParseState::Skipping { remaining } => {
                if remaining <= 1 {
                    self.reset();
                } else {
                    self.state = ParseState::Skipping {
                        remaining: remaining - 1,
                    };
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any, and the number of
    /// bytes consumed. Remaining bytes after a complete frame are not
    /// consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<(Option<ParsedFrame>, usize), FrameError> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = self.feed(byte)? {
                return Ok((Some(frame), i + 1));
            }
        }
        Ok((None, bytes.len()))
    }

    fn finish(&mut self) -> ParsedFrame {
        let frame = ParsedFrame {
            address: self.address,
            control: self.control,
            payload: self.buffer.clone(),
        };
        self.reset();
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_frame_encoding() {
        let frame = Frame::command(0x3C, &[0x01, 0x02]).unwrap();
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 6);
        assert_eq!(&buffer[..len], &[0x3C, 0x00, 0x03, 0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_data_frame_size_is_big_endian() {
        let payload = [0xFFu8; 1024];
        let frame = Frame::data(0x3C, &payload).unwrap();

        // 1024 + 1 = 0x0401
        assert_eq!(frame.header(), [0x3C, 0x04, 0x01, 0x40]);
        assert_eq!(frame.encoded_len(), 1028);
    }

    #[test]
    fn test_empty_payload_still_counts_control_byte() {
        let frame = Frame::command(0x3D, &[]).unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.header(), [0x3D, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::command(0x3C, &[0xAE, 0xAF]).unwrap();
        let mut buffer = [0u8; 5];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_frame_roundtrip() {
        let original = Frame::data(0x3C, &[1, 2, 3, 4, 5]).unwrap();
        let encoded = original.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let (parsed, consumed) = parser.feed_bytes(&encoded).unwrap();
        let parsed = parsed.unwrap();

        assert_eq!(consumed, encoded.len());
        assert_eq!(parsed.address, 0x3C);
        assert_eq!(parsed.kind(), Some(Control::Data));
        assert_eq!(&parsed.payload[..], original.payload);
        assert!(parser.is_idle());
    }

    #[test]
    fn test_parser_rejects_zero_size() {
        let mut parser = FrameParser::new();
        let result = parser.feed_bytes(&[0x3C, 0x00, 0x00]);
        assert_eq!(result, Err(FrameError::InvalidFrame));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_parser_skips_oversized_frame() {
        let mut data = std::vec::Vec::new();
        // size 0x0500 = 1279 payload bytes after control
        data.extend_from_slice(&[0x3C, 0x05, 0x00]);
        data.extend(core::iter::repeat(0xAA).take(0x0500));
        data.extend_from_slice(&[0x3C, 0x00, 0x02, 0x00, 0xAF]);

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&data[..3]), Err(FrameError::PayloadTooLarge));

        let (frame, _) = parser.feed_bytes(&data[3..]).unwrap();
        let frame = frame.unwrap();
        assert_eq!(frame.kind(), Some(Control::Command));
        assert_eq!(&frame.payload[..], &[0xAF]);
    }

    #[test]
    fn test_parser_accepts_largest_payload() {
        let payload = [0x5Au8; MAX_PAYLOAD_SIZE];
        let encoded = Frame::data(0x3C, &payload).unwrap().encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let (frame, consumed) = parser.feed_bytes(&encoded).unwrap();
        let frame = frame.unwrap();

        assert_eq!(consumed, encoded.len());
        assert_eq!(frame.payload.len(), MAX_PAYLOAD_SIZE);
        assert!(frame.payload.iter().all(|&b| b == 0x5A));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_priming_frame_layout() {
        let frame = Frame::command(0x3C, &[0u8; 8]).unwrap();
        let encoded = frame.encode_to_vec().unwrap();
        assert_eq!(&encoded[..4], &[0x3C, 0x00, 0x09, 0x00]);
        assert!(encoded[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_payload_too_large_for_vec() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let frame = Frame::data(0x3C, &large_payload).unwrap();
        assert_eq!(frame.encode_to_vec(), Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_control_byte_parsing() {
        assert_eq!(Control::from_byte(0x00), Some(Control::Command));
        assert_eq!(Control::from_byte(0x40), Some(Control::Data));
        assert_eq!(Control::from_byte(0x80), None);
    }
}
