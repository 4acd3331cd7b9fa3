pub const UBX_SYNC_CHAR_1: u8 = 0xb5; // 'µ'
pub const UBX_SYNC_CHAR_2: u8 = 0x62; // 'b'
pub(crate) const UBX_SYNC_SIZE: usize = 2;
pub(crate) const UBX_CLASS_LEN: usize = 1;
pub(crate) const UBX_ID_LEN: usize = 1;
pub(crate) const UBX_PAYLOAD_SIZE_LEN: usize = 2;
pub const UBX_HEADER_LEN: usize =
    UBX_SYNC_SIZE + UBX_CLASS_LEN + UBX_ID_LEN + UBX_PAYLOAD_SIZE_LEN;
pub const UBX_CHECKSUM_LEN: usize = 2;
pub const UBX_MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

pub(crate) const UBX_LENGTH_OFFSET: usize = 4; // After SYNC_CHAR_1, SYNC_CHAR_2, CLASS, MSG_ID

pub const NMEA_SYNC_CHAR: u8 = 0x24; // '$'
pub const NMEA_END_CHAR: u8 = 0x0a; // '\n' (<LF>)

pub const RTCM_SYNC_CHAR: u8 = 0xd3;
pub const RTCM_HEADER_SIZE: usize = 3; // sync char (1) + length field (2)
pub const RTCM_CRC_LEN: usize = 3; // CRC-24Q
pub(crate) const RTCM_RESERVED_MASK: u8 = 0xfc; // 6 reserved bits on top of the length field
pub(crate) const RTCM_LENGTH_HI_MASK: u8 = 0x03; // 2 upper bits of the 10 bit length

/// Input arena capacity: the largest UBX frame the receiver can emit.
pub const INPUT_BUFFER_CAPACITY: usize = UBX_HEADER_LEN + UBX_MAX_PAYLOAD_LEN + UBX_CHECKSUM_LEN;

/// The device answers a read with this byte when it has nothing to send.
pub const PADDING_BYTE: u8 = 0xff;

/// Register written once at start-up so that subsequent reads stream from
/// the receiver's data register.
pub const DATA_STREAM_REGISTER: u8 = 0xff;

/// Size of a single blocking device read.
pub const DEFAULT_CHUNK_SIZE: usize = 255;

/// Largest single read the i2c-dev driver accepts.
pub const MAX_CHUNK_SIZE: usize = 8192;
