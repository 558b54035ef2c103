//! SSD1306 panel controller
//!
//! Drives the controller through any [`Transport`]. The controller owns the
//! transport for its whole lifetime and releases it exactly once, either on
//! [`Ssd1306::dispose`], [`Ssd1306::release`] or drop.

use image::DynamicImage;
use log::{debug, info, warn};
use oledlink_hal::Transport;
use thiserror::Error;

use crate::command::*;
use crate::geometry::{Orientation, PanelGeometry, UnsupportedGeometry};
use crate::raster::FrameBuffer;

/// Contrast programmed by [`Ssd1306::init`]
pub const DEFAULT_CONTRAST: u8 = 0xCF;

/// Panel controller errors
#[derive(Debug, Error)]
pub enum PanelError<E: core::fmt::Debug> {
    /// Width and height do not match a supported panel
    #[error(transparent)]
    UnsupportedGeometry(#[from] UnsupportedGeometry),
    /// A transfer failed while programming the controller
    #[error("panel initialization failed: {0:?}")]
    InitializationFailed(E),
    /// A transfer failed
    #[error("transport error: {0:?}")]
    Transport(E),
    /// Raw frame length does not match the panel
    #[error("frame buffer is {actual} bytes, panel expects {expected}")]
    BufferLength { expected: usize, actual: usize },
    /// The controller was disposed
    #[error("panel has been disposed")]
    Disposed,
}

/// SSD1306 controller bound to one transport
pub struct Ssd1306<T: Transport> {
    transport: Option<T>,
    geometry: PanelGeometry,
    contrast: u8,
    disposed: bool,
}

impl<T: Transport> Ssd1306<T> {
    /// Take ownership of `transport` and initialize the panel
    ///
    /// On failure the transport is released before returning.
    pub fn new(transport: T, geometry: PanelGeometry) -> Result<Self, PanelError<T::Error>> {
        let mut panel = Self {
            transport: Some(transport),
            geometry,
            contrast: DEFAULT_CONTRAST,
            disposed: false,
        };

        if let Err(e) = panel.init() {
            panel.release();
            return Err(e);
        }

        info!(
            "panel {}x{} initialized",
            geometry.width(),
            geometry.height()
        );
        Ok(panel)
    }

    /// Shorthand for [`Ssd1306::new`] with an unrotated panel
    pub fn with_size(transport: T, width: u8, height: u8) -> Result<Self, PanelError<T::Error>> {
        let geometry = PanelGeometry::new(width, height, Orientation::Deg0)?;
        Self::new(transport, geometry)
    }

    /// Program every register, then clear and switch the panel on
    pub fn init(&mut self) -> Result<(), PanelError<T::Error>> {
        self.init_sequence().map_err(|e| match e {
            PanelError::Transport(e) => PanelError::InitializationFailed(e),
            other => other,
        })
    }

    fn init_sequence(&mut self) -> Result<(), PanelError<T::Error>> {
        let settings = *self.geometry.settings();

        self.command(&[
            DISPLAY_OFF,
            SET_CLOCK_DIV,
            settings.display_clock_div,
            SET_MUX_RATIO,
            settings.multiplex,
            SET_DISPLAY_OFFSET,
            0x00,
            SET_START_LINE,
            SET_CHARGE_PUMP,
            CHARGE_PUMP_ON,
            SET_MEMORY_MODE,
            MEMORY_MODE_HORIZONTAL,
            SET_SEG_REMAP,
            SET_COM_SCAN_DEC,
            SET_COM_PINS,
            settings.com_pins,
            SET_PRECHARGE,
            PRECHARGE_INTERNAL,
            SET_VCOM_DETECT,
            VCOM_DESELECT,
            DISPLAY_ALL_ON_RESUME,
            SET_NORMAL,
        ])?;

        self.set_contrast(DEFAULT_CONTRAST)?;
        self.clear()?;
        self.show()
    }

    /// Clear, then run the full initialization again
    pub fn restart(&mut self) -> Result<(), PanelError<T::Error>> {
        debug!("restarting panel");
        self.clear()?;
        self.init()
    }

    /// Set the contrast; any value is forwarded as is
    pub fn set_contrast(&mut self, value: u8) -> Result<(), PanelError<T::Error>> {
        self.command(&[SET_CONTRAST, value])?;
        self.contrast = value;
        Ok(())
    }

    /// Last contrast value sent successfully
    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    /// Switch the panel on
    pub fn show(&mut self) -> Result<(), PanelError<T::Error>> {
        self.command(&[DISPLAY_ON])
    }

    /// Switch the panel off (RAM is kept)
    pub fn hide(&mut self) -> Result<(), PanelError<T::Error>> {
        self.command(&[DISPLAY_OFF])
    }

    /// Write a page-addressed frame
    ///
    /// `buffer` must be exactly `width / 8 * height` bytes; otherwise nothing
    /// is sent.
    pub fn display_raw(&mut self, buffer: &[u8]) -> Result<(), PanelError<T::Error>> {
        if self.disposed {
            return Err(PanelError::Disposed);
        }

        let expected = self.geometry.buffer_len();
        if buffer.len() != expected {
            return Err(PanelError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }

        let geometry = self.geometry;
        self.command(&[
            SET_COLUMN_ADDR,
            geometry.col_start(),
            geometry.col_end() - 1,
            SET_PAGE_ADDR,
            0,
            geometry.pages() - 1,
        ])?;
        self.data(buffer)
    }

    /// Write a prepared frame
    pub fn display(&mut self, frame: &FrameBuffer) -> Result<(), PanelError<T::Error>> {
        self.display_raw(frame.as_bytes())
    }

    /// Scale, dither and pack `image`, then write it
    pub fn display_image(
        &mut self,
        image: &DynamicImage,
        invert: bool,
    ) -> Result<(), PanelError<T::Error>> {
        let frame = FrameBuffer::from_image(image, &self.geometry, invert);
        self.display(&frame)
    }

    /// Blank the panel RAM
    pub fn clear(&mut self) -> Result<(), PanelError<T::Error>> {
        self.fill(0x00)
    }

    /// Set every panel RAM byte to `value`
    pub fn fill(&mut self, value: u8) -> Result<(), PanelError<T::Error>> {
        let frame = FrameBuffer::filled(&self.geometry, value);
        self.display(&frame)
    }

    /// Hide and clear the panel, then release the transport
    ///
    /// Only the first call touches the panel. The transport is released even
    /// if hiding or clearing fails.
    pub fn dispose(&mut self) -> Result<(), PanelError<T::Error>> {
        let mut result = Ok(());
        if !self.disposed {
            debug!("disposing panel");
            result = self.hide().and_then(|()| self.clear());
            self.disposed = true;
        }
        self.release_transport();
        result
    }

    /// Release the transport and leave the panel showing its current frame
    pub fn release(&mut self) {
        self.disposed = true;
        self.release_transport();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn width(&self) -> u8 {
        self.geometry.width()
    }

    pub fn height(&self) -> u8 {
        self.geometry.height()
    }

    pub fn orientation(&self) -> Orientation {
        self.geometry.orientation()
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    fn release_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.release();
        }
    }

    fn transport(&mut self) -> Result<&mut T, PanelError<T::Error>> {
        match self.transport.as_mut() {
            Some(transport) if !self.disposed => Ok(transport),
            _ => Err(PanelError::Disposed),
        }
    }

    fn command(&mut self, bytes: &[u8]) -> Result<(), PanelError<T::Error>> {
        self.transport()?
            .send_command(bytes)
            .map_err(PanelError::Transport)
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), PanelError<T::Error>> {
        self.transport()?
            .send_data(bytes)
            .map_err(PanelError::Transport)
    }
}

impl<T: Transport> Drop for Ssd1306<T> {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            warn!("failed to dispose panel: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Sent {
        Command(Vec<u8>),
        Data(Vec<u8>),
    }

    #[derive(Debug, Default)]
    struct MockState {
        sent: Vec<Sent>,
        releases: usize,
        fail_at: Option<usize>,
    }

    #[derive(Debug, Clone, Default)]
    struct MockTransport {
        state: Rc<RefCell<MockState>>,
    }

    impl MockTransport {
        fn failing_at(index: usize) -> Self {
            let mock = Self::default();
            mock.state.borrow_mut().fail_at = Some(index);
            mock
        }

        fn sent(&self) -> Vec<Sent> {
            self.state.borrow().sent.clone()
        }

        fn take_sent(&self) -> Vec<Sent> {
            std::mem::take(&mut self.state.borrow_mut().sent)
        }

        fn releases(&self) -> usize {
            self.state.borrow().releases
        }

        fn record(&mut self, sent: Sent) -> Result<(), &'static str> {
            let mut state = self.state.borrow_mut();
            if state.fail_at == Some(state.sent.len()) {
                return Err("link down");
            }
            state.sent.push(sent);
            Ok(())
        }
    }

    impl Transport for MockTransport {
        type Error = &'static str;

        fn send_command(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.record(Sent::Command(bytes.to_vec()))
        }

        fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.record(Sent::Data(bytes.to_vec()))
        }

        fn release(&mut self) {
            self.state.borrow_mut().releases += 1;
        }
    }

    fn panel(width: u8, height: u8) -> (Ssd1306<MockTransport>, MockTransport) {
        let mock = MockTransport::default();
        let panel = Ssd1306::with_size(mock.clone(), width, height).unwrap();
        mock.take_sent();
        (panel, mock)
    }

    #[test]
    fn test_init_sequence_128x64() {
        let mock = MockTransport::default();
        let _panel = Ssd1306::with_size(mock.clone(), 128, 64).unwrap();

        assert_eq!(
            mock.sent(),
            vec![
                Sent::Command(vec![
                    0xAE, 0xD5, 0x80, 0xA8, 0x3F, 0xD3, 0x00, 0x40, 0x8D, 0x14, 0x20, 0x00, 0xA1,
                    0xC8, 0xDA, 0x12, 0xD9, 0xF1, 0xDB, 0x40, 0xA4, 0xA6,
                ]),
                Sent::Command(vec![0x81, 0xCF]),
                Sent::Command(vec![0x21, 0, 127, 0x22, 0, 7]),
                Sent::Data(vec![0; 1024]),
                Sent::Command(vec![0xAF]),
            ]
        );
    }

    #[test]
    fn test_init_uses_geometry_settings() {
        let mock = MockTransport::default();
        let _panel = Ssd1306::with_size(mock.clone(), 96, 16).unwrap();

        let sent = mock.sent();
        match &sent[0] {
            Sent::Command(burst) => {
                assert_eq!(&burst[1..5], &[0xD5, 0x60, 0xA8, 0x0F]);
                assert_eq!(&burst[14..16], &[0xDA, 0x02]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sent[2], Sent::Command(vec![0x21, 16, 111, 0x22, 0, 1]));
        assert_eq!(sent[3], Sent::Data(vec![0; 192]));
    }

    #[test]
    fn test_unsupported_geometry_sends_nothing() {
        let mock = MockTransport::default();
        let result = Ssd1306::with_size(mock.clone(), 128, 128);

        assert!(matches!(
            result,
            Err(PanelError::UnsupportedGeometry(UnsupportedGeometry {
                width: 128,
                height: 128
            }))
        ));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_init_failure_releases_transport() {
        let mock = MockTransport::failing_at(1);
        let result = Ssd1306::with_size(mock.clone(), 128, 32);

        assert!(matches!(
            result,
            Err(PanelError::InitializationFailed("link down"))
        ));
        assert_eq!(mock.releases(), 1);
        assert_eq!(mock.sent().len(), 1);
    }

    #[test]
    fn test_display_raw_rejects_wrong_length() {
        let (mut panel, mock) = panel(128, 64);

        let result = panel.display_raw(&[0u8; 10]);

        assert!(matches!(
            result,
            Err(PanelError::BufferLength {
                expected: 1024,
                actual: 10
            })
        ));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_display_raw_sets_window_then_streams() {
        let (mut panel, mock) = panel(64, 48);
        let buffer: Vec<u8> = (0..384).map(|i| i as u8).collect();

        panel.display_raw(&buffer).unwrap();

        assert_eq!(
            mock.sent(),
            vec![
                Sent::Command(vec![0x21, 32, 95, 0x22, 0, 5]),
                Sent::Data(buffer),
            ]
        );
    }

    #[test]
    fn test_fill_and_clear() {
        let (mut panel, mock) = panel(64, 32);

        panel.fill(0x55).unwrap();
        panel.clear().unwrap();

        let sent = mock.sent();
        assert_eq!(sent[1], Sent::Data(vec![0x55; 256]));
        assert_eq!(sent[3], Sent::Data(vec![0x00; 256]));
    }

    #[test]
    fn test_contrast_cached_only_on_success() {
        let (mut panel, mock) = panel(128, 64);
        assert_eq!(panel.contrast(), DEFAULT_CONTRAST);

        panel.set_contrast(0x10).unwrap();
        assert_eq!(panel.contrast(), 0x10);
        assert_eq!(mock.sent(), vec![Sent::Command(vec![0x81, 0x10])]);

        mock.state.borrow_mut().fail_at = Some(1);
        assert!(matches!(
            panel.set_contrast(0x20),
            Err(PanelError::Transport("link down"))
        ));
        assert_eq!(panel.contrast(), 0x10);
        mock.state.borrow_mut().fail_at = None;
    }

    #[test]
    fn test_show_hide() {
        let (mut panel, mock) = panel(128, 32);

        panel.hide().unwrap();
        panel.show().unwrap();

        assert_eq!(
            mock.sent(),
            vec![Sent::Command(vec![0xAE]), Sent::Command(vec![0xAF])]
        );
    }

    #[test]
    fn test_restart_clears_then_reinitializes() {
        let (mut panel, mock) = panel(128, 32);
        panel.set_contrast(0x01).unwrap();
        mock.take_sent();

        panel.restart().unwrap();

        let sent = mock.sent();
        assert_eq!(sent[0], Sent::Command(vec![0x21, 0, 127, 0x22, 0, 3]));
        assert_eq!(sent[1], Sent::Data(vec![0; 512]));
        assert!(matches!(&sent[2], Sent::Command(burst) if burst.len() == 22));
        assert_eq!(sent.last(), Some(&Sent::Command(vec![0xAF])));
        assert_eq!(panel.contrast(), DEFAULT_CONTRAST);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut panel, mock) = panel(128, 64);

        panel.dispose().unwrap();
        assert_eq!(
            mock.take_sent(),
            vec![
                Sent::Command(vec![0xAE]),
                Sent::Command(vec![0x21, 0, 127, 0x22, 0, 7]),
                Sent::Data(vec![0; 1024]),
            ]
        );
        assert_eq!(mock.releases(), 1);
        assert!(panel.is_disposed());

        panel.dispose().unwrap();
        drop(panel);
        assert!(mock.sent().is_empty());
        assert_eq!(mock.releases(), 1);
    }

    #[test]
    fn test_operations_after_dispose_fail() {
        let (mut panel, mock) = panel(128, 64);
        panel.dispose().unwrap();
        mock.take_sent();

        assert!(matches!(panel.show(), Err(PanelError::Disposed)));
        assert!(matches!(panel.fill(0xFF), Err(PanelError::Disposed)));
        assert!(matches!(
            panel.display_raw(&[0; 1024]),
            Err(PanelError::Disposed)
        ));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_dispose_releases_even_when_hide_fails() {
        let (mut panel, mock) = panel(128, 64);
        mock.state.borrow_mut().fail_at = Some(0);

        assert!(panel.dispose().is_err());
        assert!(panel.is_disposed());
        assert_eq!(mock.releases(), 1);
    }

    #[test]
    fn test_drop_disposes() {
        let (panel, mock) = panel(64, 32);

        drop(panel);

        assert_eq!(mock.sent()[0], Sent::Command(vec![0xAE]));
        assert_eq!(mock.releases(), 1);
    }

    #[test]
    fn test_release_keeps_panel_content() {
        let (mut panel, mock) = panel(64, 32);

        panel.release();
        drop(panel);

        assert!(mock.sent().is_empty());
        assert_eq!(mock.releases(), 1);
    }

    #[test]
    fn test_display_image_inverted() {
        let (mut panel, mock) = panel(64, 32);
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([0])));

        panel.display_image(&image, true).unwrap();

        assert_eq!(mock.sent()[1], Sent::Data(vec![0xFF; 256]));
    }
}
