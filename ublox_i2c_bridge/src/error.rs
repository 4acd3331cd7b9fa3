use std::io;

/// Errors surfaced by the device bridge and the polling loop.
///
/// Framing problems never show up here: the detector resynchronizes on its own.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The device returned no bytes at all. The receiver always answers a
    /// read with at least padding, so this means the bus is gone.
    #[error("device read returned no data")]
    DeviceDrained,

    #[error("device read failed: {0}")]
    Read(#[source] io::Error),

    #[error("failed to forward {kind} frame of {len} bytes: {source}")]
    Write {
        kind: crate::FrameKind,
        len: usize,
        #[source]
        source: io::Error,
    },

    /// Only reported when the write check is enabled.
    #[error("short write forwarding {kind} frame, wrote {written} of {expected} bytes")]
    ShortWrite {
        kind: crate::FrameKind,
        written: usize,
        expected: usize,
    },

    #[error("host input read failed: {0}")]
    HostRead(#[source] io::Error),

    #[error("host output write failed: {0}")]
    HostWrite(#[source] io::Error),

    #[error("invalid chunk size {size}, expected 1..={max}")]
    InvalidChunkSize { size: usize, max: usize },
}

impl BridgeError {
    /// True for errors raised while forwarding a frame to the device.
    pub fn is_forward_failure(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::ShortWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
