use core::convert::Infallible;
use std::io::{self, ErrorKind, Read, Write};

use log::{debug, trace, warn};

use crate::{
    config::BridgeConfig,
    detector::{DetectorStats, FrameDetector},
    device::DeviceBridge,
    error::{BridgeError, Result},
    host::HostInput,
};

/// What happened during one polling cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Bytes taken from the host input.
    pub host_bytes: usize,
    pub frames_forwarded: usize,
    /// Frames the device did not fully accept. Only non-zero when failures
    /// are not fatal.
    pub forward_failures: usize,
    /// Bytes written to the host output, padding excluded.
    pub device_bytes: usize,
}

/// The duplex polling loop.
///
/// Each cycle drains every byte the host input has available right now
/// through the frame detector, forwarding completed frames to the device as
/// soon as they are recognized. It then performs exactly one blocking device
/// read and copies the non-padding bytes to the host output.
pub struct Bridge<H, O, D> {
    input: H,
    output: O,
    device: DeviceBridge<D>,
    detector: FrameDetector,
    config: BridgeConfig,
    cycles: u64,
}

impl<H, O, D> Bridge<H, O, D>
where
    H: HostInput,
    O: Write,
    D: Read + Write,
{
    pub fn new(input: H, output: O, device: D, config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            input,
            output,
            device: DeviceBridge::new(device, config.write_check),
            detector: FrameDetector::new(config.rtcm_framing),
            config,
            cycles: 0,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn detector_stats(&self) -> &DetectorStats {
        self.detector.stats()
    }

    /// Number of completed polling cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn device(&self) -> &D {
        self.device.get_ref()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_parts(self) -> (H, O, D) {
        (self.input, self.output, self.device.into_inner())
    }

    /// Runs a single polling cycle.
    pub fn poll_once(&mut self) -> Result<CycleStats> {
        let mut stats = CycleStats::default();

        while let Some(byte) = self.input.try_read_byte().map_err(BridgeError::HostRead)? {
            stats.host_bytes += 1;
            let Some(frame) = self.detector.feed(byte) else {
                continue;
            };
            match self.device.forward(frame) {
                Ok(()) => stats.frames_forwarded += 1,
                Err(e) if self.config.write_check.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("{e}");
                    stats.forward_failures += 1;
                },
            }
        }

        let data = self.device.drain_once(self.config.chunk_size)?;
        if !data.is_empty() {
            relay(&mut self.output, data).map_err(BridgeError::HostWrite)?;
        }
        stats.device_bytes = data.len();

        self.cycles += 1;
        if stats != CycleStats::default() {
            trace!("Cycle {}: {:?}", self.cycles, stats);
        }
        Ok(stats)
    }

    /// Polls until a fatal error occurs, which is returned.
    pub fn run(&mut self) -> Result<Infallible> {
        loop {
            if let Err(e) = self.poll_once() {
                debug!(
                    "Bridge stopped after {} cycles: {:?}",
                    self.cycles,
                    self.detector.stats()
                );
                return Err(e);
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted)
}

/// Writes all of `data` and flushes, retrying while the output is
/// momentarily unavailable. A non-blocking stdin may share its file
/// description with stdout.
fn relay<O: Write>(output: &mut O, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match output.write(data) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(e) if is_transient(&e) => std::thread::yield_now(),
            Err(e) => return Err(e),
        }
    }
    loop {
        match output.flush() {
            Ok(()) => return Ok(()),
            Err(e) if is_transient(&e) => std::thread::yield_now(),
            Err(e) => return Err(e),
        }
    }
}
