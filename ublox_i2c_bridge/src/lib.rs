//! # ublox_i2c_bridge
//!
//! Bridges a raw host byte stream to a u-blox receiver attached over I2C. Host
//! bytes are cut into complete UBX, NMEA and RTCM3 frames which are written to
//! the device one frame per bus transaction, while the receiver output is read
//! back, stripped of its `0xFF` padding and handed to the host.
//!
//! Detecting Frames
//! ================
//!
//! The `FrameDetector` is fed one byte at a time and returns a `Frame` when
//! the byte completes one. The frame borrows the detector's buffer, so it has
//! to be used before the next byte is fed:
//! ```
//! use ublox_i2c_bridge::{FrameDetector, FrameKind};
//!
//! let mut detector = FrameDetector::default();
//! let data = [0xb5, 0x62, 0x01, 0x02, 0x03, 0x00, 0xaa, 0xbb, 0xcc, 0x11, 0x22];
//! let mut frames = vec![];
//! for byte in data {
//!     if let Some(frame) = detector.feed(byte) {
//!         assert_eq!(frame.kind(), FrameKind::Ubx);
//!         frames.push(frame.as_bytes().to_vec());
//!     }
//! }
//! assert_eq!(frames, vec![data.to_vec()]);
//! ```
//! Checksums are not verified. Bytes that do not belong to a frame are
//! dropped, and a frame that does not fit the input buffer is discarded.
//!
//! Running the Bridge
//! ==================
//!
//! `Bridge` drives the whole loop. Any `HostInput` can feed it (see
//! `NonBlocking` to wrap a non-blocking reader), any `Write` receives the
//! device output and any `Read + Write` can stand in for the device:
//! ```no_run
//! use std::fs::OpenOptions;
//! use ublox_i2c_bridge::{Bridge, BridgeConfig, NonBlocking};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Slave address selection is left to the caller.
//! let device = OpenOptions::new().read(true).write(true).open("/dev/i2c-1")?;
//! let input = NonBlocking::new(std::io::stdin());
//! let mut bridge = Bridge::new(input, std::io::stdout(), device, BridgeConfig::default())?;
//! let err = match bridge.run() {
//!     Ok(never) => match never {},
//!     Err(e) => e,
//! };
//! eprintln!("bridge stopped: {err}");
//! # Ok(())
//! # }
//! ```

pub use crate::{
    bridge::{Bridge, CycleStats},
    buffer::InputBuffer,
    config::{BridgeConfig, RtcmFraming, WriteCheck},
    detector::{DetectorStats, Frame, FrameDetector, FrameKind, ParserState},
    device::DeviceBridge,
    error::{BridgeError, Result},
    host::{HostInput, NonBlocking},
};

mod bridge;
mod buffer;
mod config;
pub mod constants;
mod detector;
mod device;
mod error;
mod host;
