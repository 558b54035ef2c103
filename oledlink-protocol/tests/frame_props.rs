//! Property tests for the UART bridge framing.

use oledlink_protocol::{Control, Frame, FrameParser, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use proptest::prelude::*;

fn control() -> impl Strategy<Value = Control> {
    prop_oneof![Just(Control::Command), Just(Control::Data)]
}

proptest! {
    /// The size field always equals the payload length plus the control byte.
    #[test]
    fn size_field_counts_control_byte(
        address in any::<u8>(),
        control in control(),
        payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
    ) {
        let frame = Frame::new(address, control, &payload).unwrap();
        let header = frame.header();

        prop_assert_eq!(header[0], address);
        prop_assert_eq!(u16::from_be_bytes([header[1], header[2]]) as usize, payload.len() + 1);
        prop_assert_eq!(header[3], control.byte());
    }

    /// A stream of back-to-back frames parses back into the same frames.
    #[test]
    fn parser_recovers_frame_stream(
        frames in proptest::collection::vec(
            (any::<u8>(), control(), proptest::collection::vec(any::<u8>(), 0..64)),
            1..8,
        ),
    ) {
        let mut stream = Vec::new();
        for (address, control, payload) in &frames {
            let frame = Frame::new(*address, *control, payload).unwrap();
            stream.extend_from_slice(&frame.encode_to_vec().unwrap());
        }

        let mut parser = FrameParser::new();
        let mut parsed = Vec::new();
        let mut rest = &stream[..];
        while !rest.is_empty() {
            let (frame, consumed) = parser.feed_bytes(rest).unwrap();
            if let Some(frame) = frame {
                parsed.push(frame);
            }
            rest = &rest[consumed..];
        }

        prop_assert_eq!(parsed.len(), frames.len());
        for (got, (address, control, payload)) in parsed.iter().zip(&frames) {
            prop_assert_eq!(got.address, *address);
            prop_assert_eq!(got.kind(), Some(*control));
            prop_assert_eq!(&got.payload[..], &payload[..]);
        }
    }

    /// Encoding writes exactly header + payload bytes.
    #[test]
    fn encode_length(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        let frame = Frame::data(0x3C, &payload).unwrap();
        let mut buffer = vec![0u8; HEADER_SIZE + payload.len()];
        prop_assert_eq!(frame.encode(&mut buffer).unwrap(), HEADER_SIZE + payload.len());
        prop_assert_eq!(&buffer[HEADER_SIZE..], &payload[..]);
    }
}
