use core::{fmt, str::FromStr};

use crate::{
    constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, RTCM_LENGTH_HI_MASK, RTCM_RESERVED_MASK},
    error::{BridgeError, Result},
};

/// How the RTCM3 length header is interpreted.
///
/// The RTCM3 header is `0xD3`, then 6 reserved bits followed by a 10 bit
/// big-endian payload length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RtcmFraming {
    /// Reserved bits must be zero and only the 10 length bits count.
    #[default]
    Standard,
    /// Reserved bits are not checked and the whole second byte is taken as
    /// the length high byte, as u-blox's own C bridge does.
    Reference,
}

impl RtcmFraming {
    /// Whether `byte`, the one following the preamble, may start an RTCM3 header.
    pub fn accepts_length_byte(self, byte: u8) -> bool {
        match self {
            Self::Standard => byte & RTCM_RESERVED_MASK == 0,
            Self::Reference => true,
        }
    }

    /// Payload length encoded by the two header bytes after the preamble.
    pub fn payload_len(self, hi: u8, lo: u8) -> usize {
        match self {
            Self::Standard => usize::from(u16::from_be_bytes([hi & RTCM_LENGTH_HI_MASK, lo])),
            Self::Reference => usize::from(u16::from_be_bytes([hi, lo])),
        }
    }
}

impl fmt::Display for RtcmFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

impl FromStr for RtcmFraming {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "reference" => Ok(Self::Reference),
            _ => Err(format!(
                "unknown RTCM framing '{s}', expected 'standard' or 'reference'"
            )),
        }
    }
}

/// What to do when forwarding a frame to the device does not fully succeed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WriteCheck {
    /// Ignore the written length. Write errors are still logged.
    Unchecked,
    /// Log short writes and write errors, keep bridging.
    #[default]
    Warn,
    /// Short writes and write errors stop the bridge.
    Strict,
}

impl WriteCheck {
    pub fn checks_length(self) -> bool {
        !matches!(self, Self::Unchecked)
    }

    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for WriteCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchecked => f.write_str("unchecked"),
            Self::Warn => f.write_str("warn"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for WriteCheck {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unchecked" => Ok(Self::Unchecked),
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "unknown write check '{s}', expected 'unchecked', 'warn' or 'strict'"
            )),
        }
    }
}

/// Runtime settings of a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeConfig {
    /// Maximum number of bytes requested from the device per cycle.
    pub chunk_size: usize,
    pub write_check: WriteCheck,
    pub rtcm_framing: RtcmFraming,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            write_check: WriteCheck::default(),
            rtcm_framing: RtcmFraming::default(),
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(BridgeError::InvalidChunkSize {
                size: self.chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }
        Ok(())
    }
}
