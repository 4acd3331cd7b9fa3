#[macro_use]
extern crate afl;

use ublox_i2c_bridge::{FrameDetector, FrameKind, InputBuffer, RtcmFraming};

fn check_frame(kind: FrameKind, frame: &[u8], capacity: usize) {
    assert!(frame.len() < capacity);
    match kind {
        FrameKind::Ubx => {
            assert_eq!(&frame[..2], &[0xb5, 0x62]);
            let len = u16::from_le_bytes([frame[4], frame[5]]) as usize;
            assert_eq!(frame.len(), 6 + len + 2);
        },
        FrameKind::Nmea => {
            assert_eq!(frame[0], b'$');
            assert_eq!(frame.iter().position(|&b| b == b'\n'), Some(frame.len() - 1));
        },
        FrameKind::Rtcm3 => {
            assert_eq!(frame[0], 0xd3);
            assert!(frame.len() >= 6);
        },
    }
}

fn detect(bufsize: usize, framing: RtcmFraming, data: &[u8]) {
    let mut detector = FrameDetector::with_buffer(InputBuffer::with_capacity(bufsize), framing);
    let capacity = detector.capacity();
    for &byte in data {
        if let Some(frame) = detector.feed(byte) {
            check_frame(frame.kind(), frame.as_bytes(), capacity);
        }
    }

    // Whatever the garbage left behind, a fresh frame must come through once
    // the detector is back to idle.
    let ack_ack = [0xb5, 0x62, 0x5, 0x1, 0x2, 0x0, 0x4, 0x5, 0x11, 0x38];
    detector.reset();
    let mut num_acks = 0;
    detector.consume(&ack_ack, |frame| {
        assert_eq!(frame.as_bytes(), &ack_ack);
        num_acks += 1;
    });
    assert_eq!(num_acks, 1);
}

fn main() {
    fuzz!(|data: &[u8]| {
        if data.len() > 2 {
            let bufsize = data[0] as usize;
            let framing = if data[1] & 1 == 0 {
                RtcmFraming::Standard
            } else {
                RtcmFraming::Reference
            };
            if bufsize >= 16 {
                detect(bufsize, framing, &data[2..]);
            }
        }
    });
}
