//! Byte-at-a-time frame boundary detection for UBX, NMEA and RTCM3 streams.

use core::fmt;
use log::{debug, trace};

use crate::{
    buffer::InputBuffer,
    config::RtcmFraming,
    constants::{
        NMEA_END_CHAR, NMEA_SYNC_CHAR, RTCM_CRC_LEN, RTCM_HEADER_SIZE, RTCM_SYNC_CHAR,
        UBX_CHECKSUM_LEN, UBX_HEADER_LEN, UBX_LENGTH_OFFSET, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    Ubx,
    Nmea,
    Rtcm3,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ubx => f.write_str("UBX"),
            Self::Nmea => f.write_str("NMEA"),
            Self::Rtcm3 => f.write_str("RTCM3"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    UbxSync2,
    UbxHeader,
    UbxPayload,
    NmeaPayload,
    RtcmSync2,
    RtcmHeader,
    RtcmPayload,
}

impl ParserState {
    /// The format being assembled, `None` while idle.
    pub fn kind(self) -> Option<FrameKind> {
        match self {
            Self::Idle => None,
            Self::UbxSync2 | Self::UbxHeader | Self::UbxPayload => Some(FrameKind::Ubx),
            Self::NmeaPayload => Some(FrameKind::Nmea),
            Self::RtcmSync2 | Self::RtcmHeader | Self::RtcmPayload => Some(FrameKind::Rtcm3),
        }
    }
}

/// A complete frame, borrowed from the detector's input buffer.
///
/// The borrow ends with the next call to [`FrameDetector::feed`], which
/// reuses the buffer, so a frame has to be forwarded or copied right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    kind: FrameKind,
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false, frames hold at least their sync byte.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

/// Counters of what the detector has seen since it was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DetectorStats {
    pub ubx_frames: u64,
    pub nmea_frames: u64,
    pub rtcm_frames: u64,
    /// Bytes dropped while idle because they are no sync character.
    pub discarded_bytes: u64,
    /// Frames abandoned because the second sync/header byte was wrong.
    pub sync_mismatches: u64,
    /// Frames abandoned because they did not fit the input buffer.
    pub overflows: u64,
}

impl DetectorStats {
    pub fn frames(&self) -> u64 {
        self.ubx_frames + self.nmea_frames + self.rtcm_frames
    }

    fn count_frame(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::Ubx => self.ubx_frames += 1,
            FrameKind::Nmea => self.nmea_frames += 1,
            FrameKind::Rtcm3 => self.rtcm_frames += 1,
        }
    }
}

/// Streaming frame detector.
///
/// Bytes are pushed one at a time with [`feed`](Self::feed). Frames are
/// recognized by their sync characters and length fields only, checksums
/// are never verified. Anything that does not fit a frame is dropped and the
/// detector waits for the next sync character.
pub struct FrameDetector {
    buf: InputBuffer,
    state: ParserState,
    target_len: Option<usize>,
    rtcm_framing: RtcmFraming,
    stats: DetectorStats,
}

impl Default for FrameDetector {
    fn default() -> Self {
        Self::new(RtcmFraming::default())
    }
}

impl FrameDetector {
    pub fn new(rtcm_framing: RtcmFraming) -> Self {
        Self::with_buffer(InputBuffer::default(), rtcm_framing)
    }

    /// Builds a detector on a custom arena. Frames longer than
    /// `buf.capacity() - 1` bytes are discarded.
    pub fn with_buffer(mut buf: InputBuffer, rtcm_framing: RtcmFraming) -> Self {
        buf.clear();
        Self {
            buf,
            state: ParserState::Idle,
            target_len: None,
            rtcm_framing,
            stats: DetectorStats::default(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Total length of the binary frame in progress, once its length field is known.
    pub fn target_len(&self) -> Option<usize> {
        self.target_len
    }

    /// Number of bytes of the frame in progress.
    pub fn buffered(&self) -> usize {
        if self.state == ParserState::Idle {
            0
        } else {
            self.buf.len()
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn rtcm_framing(&self) -> RtcmFraming {
        self.rtcm_framing
    }

    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    /// Drops the frame in progress, if any.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.target_len = None;
        self.buf.clear();
    }

    /// Consumes one byte, returning the frame it completes.
    pub fn feed(&mut self, byte: u8) -> Option<Frame<'_>> {
        if self.state == ParserState::Idle {
            // The previous frame, if any, has been handed out already.
            self.buf.clear();
        } else if self.buf.is_full() {
            debug!(
                "Discarding {} buffered bytes of {:?} frame: input buffer full",
                self.buf.len(),
                self.state.kind()
            );
            self.stats.overflows += 1;
            self.reset();
        }

        match self.state {
            ParserState::Idle => {
                let next = match byte {
                    UBX_SYNC_CHAR_1 => ParserState::UbxSync2,
                    NMEA_SYNC_CHAR => ParserState::NmeaPayload,
                    RTCM_SYNC_CHAR => ParserState::RtcmSync2,
                    _ => {
                        self.stats.discarded_bytes += 1;
                        return None;
                    },
                };
                self.store(byte);
                self.state = next;
                None
            },
            ParserState::UbxSync2 => {
                if byte != UBX_SYNC_CHAR_2 {
                    return self.mismatch(byte);
                }
                self.store(byte);
                self.state = ParserState::UbxHeader;
                None
            },
            ParserState::UbxHeader => {
                self.store(byte);
                if self.buf.len() == UBX_HEADER_LEN {
                    let payload_len = usize::from(u16::from_le_bytes([
                        self.buf[UBX_LENGTH_OFFSET],
                        self.buf[UBX_LENGTH_OFFSET + 1],
                    ]));
                    self.target_len = Some(UBX_HEADER_LEN + payload_len + UBX_CHECKSUM_LEN);
                    self.state = ParserState::UbxPayload;
                }
                None
            },
            ParserState::UbxPayload => {
                self.store(byte);
                self.complete_at_target(FrameKind::Ubx)
            },
            ParserState::NmeaPayload => {
                self.store(byte);
                if byte == NMEA_END_CHAR {
                    return self.complete(FrameKind::Nmea);
                }
                None
            },
            ParserState::RtcmSync2 => {
                if !self.rtcm_framing.accepts_length_byte(byte) {
                    return self.mismatch(byte);
                }
                self.store(byte);
                self.state = ParserState::RtcmHeader;
                None
            },
            ParserState::RtcmHeader => {
                self.store(byte);
                if self.buf.len() == RTCM_HEADER_SIZE {
                    let payload_len = self.rtcm_framing.payload_len(self.buf[1], self.buf[2]);
                    self.target_len = Some(RTCM_HEADER_SIZE + payload_len + RTCM_CRC_LEN);
                    self.state = ParserState::RtcmPayload;
                }
                None
            },
            ParserState::RtcmPayload => {
                self.store(byte);
                self.complete_at_target(FrameKind::Rtcm3)
            },
        }
    }

    /// Feeds every byte of `data`, handing each completed frame to `on_frame`.
    pub fn consume<F: FnMut(Frame<'_>)>(&mut self, data: &[u8], mut on_frame: F) {
        for &byte in data {
            if let Some(frame) = self.feed(byte) {
                on_frame(frame);
            }
        }
    }

    fn store(&mut self, byte: u8) {
        let stored = self.buf.push(byte);
        debug_assert!(stored, "overflow must be handled before storing");
    }

    fn mismatch(&mut self, byte: u8) -> Option<Frame<'_>> {
        trace!(
            "Unexpected byte {:#04x} after {:?} sync, resynchronizing",
            byte,
            self.state.kind()
        );
        self.stats.sync_mismatches += 1;
        self.reset();
        None
    }

    fn complete_at_target(&mut self, kind: FrameKind) -> Option<Frame<'_>> {
        match self.target_len {
            Some(len) if self.buf.len() == len => self.complete(kind),
            _ => None,
        }
    }

    fn complete(&mut self, kind: FrameKind) -> Option<Frame<'_>> {
        self.state = ParserState::Idle;
        self.target_len = None;
        self.stats.count_frame(kind);
        trace!("{} frame of {} bytes", kind, self.buf.len());
        Some(Frame {
            kind,
            data: self.buf.as_slice(),
        })
    }
}
