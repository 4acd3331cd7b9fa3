use std::io::{Read, Write};

use log::trace;

use crate::{
    config::WriteCheck,
    constants::PADDING_BYTE,
    detector::Frame,
    error::{BridgeError, Result},
};

/// Owns the device side of the bridge: frames go in with [`forward`](Self::forward),
/// receiver output comes back with [`drain_once`](Self::drain_once).
///
/// The device is anything readable and writable; on Linux this is an
/// `/dev/i2c-*` node with the slave address already selected, where every
/// `write` call becomes one bus transaction.
pub struct DeviceBridge<D> {
    device: D,
    write_check: WriteCheck,
    scratch: Vec<u8>,
}

impl<D: Read + Write> DeviceBridge<D> {
    pub fn new(device: D, write_check: WriteCheck) -> Self {
        Self {
            device,
            write_check,
            scratch: Vec::new(),
        }
    }

    pub fn write_check(&self) -> WriteCheck {
        self.write_check
    }

    /// Writes the whole frame with a single `write` call.
    ///
    /// The frame is never split: a partial write is reported as
    /// [`BridgeError::ShortWrite`] when the write check is enabled and
    /// otherwise ignored.
    pub fn forward(&mut self, frame: Frame<'_>) -> Result<()> {
        let data = frame.as_bytes();
        let written = self.device.write(data).map_err(|source| BridgeError::Write {
            kind: frame.kind(),
            len: data.len(),
            source,
        })?;
        trace!("Forwarded {} frame, {}/{} bytes", frame.kind(), written, data.len());
        if self.write_check.checks_length() && written != data.len() {
            return Err(BridgeError::ShortWrite {
                kind: frame.kind(),
                written,
                expected: data.len(),
            });
        }
        Ok(())
    }

    /// Performs one blocking read of up to `max_bytes` and returns what the
    /// device sent, without padding bytes.
    ///
    /// The returned slice may be empty when the device only sent padding. A
    /// read of zero bytes is a device failure, not an absence of data.
    pub fn drain_once(&mut self, max_bytes: usize) -> Result<&[u8]> {
        self.scratch.resize(max_bytes, 0);
        let nbytes = self.device.read(&mut self.scratch).map_err(BridgeError::Read)?;
        if nbytes == 0 {
            return Err(BridgeError::DeviceDrained);
        }
        self.scratch.truncate(nbytes);
        self.scratch.retain(|&b| b != PADDING_BYTE);
        Ok(&self.scratch)
    }

    pub fn get_ref(&self) -> &D {
        &self.device
    }

    pub fn get_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::detector::FrameDetector;
    use std::io;

    /// Device answering reads from a fixed script and accepting at most
    /// `write_limit` bytes per write.
    struct ScriptedDevice {
        reads: Vec<Vec<u8>>,
        written: Vec<Vec<u8>>,
        write_limit: usize,
        fail_writes: bool,
    }

    impl ScriptedDevice {
        fn new(reads: Vec<Vec<u8>>) -> Self {
            Self {
                reads,
                written: vec![],
                write_limit: usize::MAX,
                fail_writes: false,
            }
        }
    }

    impl Read for ScriptedDevice {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.reads.is_empty() {
                return Ok(0);
            }
            let chunk = self.reads.remove(0);
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }
    }

    impl Write for ScriptedDevice {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::other("nack"));
            }
            let n = buf.len().min(self.write_limit);
            self.written.push(buf[..n].to_vec());
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_nmea_frame(f: impl FnOnce(Frame<'_>)) {
        let mut detector = FrameDetector::default();
        let mut f = Some(f);
        detector.consume(b"$GPTXT,hi*00\n", |frame| {
            if let Some(f) = f.take() {
                f(frame)
            }
        });
        assert!(f.is_none(), "no frame detected");
    }

    #[test]
    fn drain_filters_padding() {
        let device = ScriptedDevice::new(vec![vec![0xff, 0x41, 0xff, 0x42]]);
        let mut bridge = DeviceBridge::new(device, WriteCheck::Warn);
        assert_eq!(bridge.drain_once(255).unwrap(), &[0x41, 0x42]);
    }

    #[test]
    fn drain_of_only_padding_is_empty_not_error() {
        let device = ScriptedDevice::new(vec![vec![0xff; 32]]);
        let mut bridge = DeviceBridge::new(device, WriteCheck::Warn);
        assert!(bridge.drain_once(255).unwrap().is_empty());
    }

    #[test]
    fn drain_zero_bytes_is_fatal() {
        let mut bridge = DeviceBridge::new(ScriptedDevice::new(vec![]), WriteCheck::Warn);
        assert!(matches!(bridge.drain_once(255), Err(BridgeError::DeviceDrained)));
    }

    #[test]
    fn drain_respects_max_bytes() {
        let device = ScriptedDevice::new(vec![vec![1, 2, 3, 4, 5]]);
        let mut bridge = DeviceBridge::new(device, WriteCheck::Warn);
        assert_eq!(bridge.drain_once(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn scratch_is_reused_between_drains() {
        let device = ScriptedDevice::new(vec![vec![1, 2, 3, 4], vec![0xff, 9]]);
        let mut bridge = DeviceBridge::new(device, WriteCheck::Warn);
        assert_eq!(bridge.drain_once(8).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(bridge.drain_once(8).unwrap(), &[9]);
    }

    #[test]
    fn forward_writes_frame_in_one_call() {
        let mut bridge = DeviceBridge::new(ScriptedDevice::new(vec![]), WriteCheck::Strict);
        with_nmea_frame(|frame| bridge.forward(frame).unwrap());
        assert_eq!(bridge.get_ref().written, vec![b"$GPTXT,hi*00\n".to_vec()]);
    }

    #[test]
    fn short_write_detected_when_checked() {
        let mut device = ScriptedDevice::new(vec![]);
        device.write_limit = 4;
        let mut bridge = DeviceBridge::new(device, WriteCheck::Warn);
        with_nmea_frame(|frame| {
            let err = bridge.forward(frame).unwrap_err();
            assert!(matches!(
                err,
                BridgeError::ShortWrite {
                    written: 4,
                    expected: 13,
                    ..
                }
            ));
            assert!(err.is_forward_failure());
        });
    }

    #[test]
    fn short_write_ignored_when_unchecked() {
        let mut device = ScriptedDevice::new(vec![]);
        device.write_limit = 4;
        let mut bridge = DeviceBridge::new(device, WriteCheck::Unchecked);
        with_nmea_frame(|frame| bridge.forward(frame).unwrap());
        assert_eq!(bridge.into_inner().written, vec![b"$GPT".to_vec()]);
    }

    #[test]
    fn write_error_always_reported() {
        let mut device = ScriptedDevice::new(vec![]);
        device.fail_writes = true;
        let mut bridge = DeviceBridge::new(device, WriteCheck::Unchecked);
        with_nmea_frame(|frame| {
            assert!(matches!(
                bridge.forward(frame),
                Err(BridgeError::Write { len: 13, .. })
            ));
        });
    }
}
