//! End-to-end polling loop behaviour against scripted host and device channels.

use std::{collections::VecDeque, io};

use proptest::prelude::*;
use ublox_i2c_bridge::{
    Bridge, BridgeConfig, BridgeError, CycleStats, HostInput, RtcmFraming, WriteCheck,
};

/// Host input delivering bursts of bytes, one burst per polling cycle.
#[derive(Default)]
struct BurstInput {
    script: VecDeque<Option<u8>>,
}

impl BurstInput {
    fn new<I: IntoIterator<Item = Vec<u8>>>(bursts: I) -> Self {
        let mut script = VecDeque::new();
        for burst in bursts {
            script.extend(burst.into_iter().map(Some));
            script.push_back(None);
        }
        Self { script }
    }
}

impl HostInput for BurstInput {
    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.script.pop_front().flatten())
    }
}

struct FailingInput;

impl HostInput for FailingInput {
    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        Err(io::ErrorKind::BrokenPipe.into())
    }
}

/// Device replaying scripted reads; an exhausted script reads zero bytes.
#[derive(Default)]
struct MockDevice {
    reads: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    write_limit: Option<usize>,
}

impl MockDevice {
    fn with_reads<I: IntoIterator<Item = Vec<u8>>>(reads: I) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl io::Read for MockDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.reads.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl io::Write for MockDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        self.writes.push(buf[..n].to_vec());
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenOutput;

impl io::Write for BrokenOutput {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output that is busy for a number of calls, then takes at most `burst`
/// bytes per write.
struct BusyOutput {
    busy: usize,
    burst: usize,
    data: Vec<u8>,
    flushes: usize,
}

impl BusyOutput {
    fn new(busy: usize, burst: usize) -> Self {
        Self {
            busy,
            burst,
            data: vec![],
            flushes: 0,
        }
    }

    fn take_turn(&mut self) -> io::Result<()> {
        if self.busy > 0 {
            self.busy -= 1;
            let kind = if self.busy % 2 == 0 {
                io::ErrorKind::WouldBlock
            } else {
                io::ErrorKind::Interrupted
            };
            return Err(kind.into());
        }
        Ok(())
    }
}

impl io::Write for BusyOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.take_turn()?;
        let n = buf.len().min(self.burst);
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

const ACK_ACK: [u8; 10] = [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x01, 0x0f, 0x38];
const GNTXT: &[u8] = b"$GNTXT,01,01,02,u-blox AG - www.u-blox.com*4E\r\n";
const RTCM_1005: [u8; 25] = [
    0xd3, 0x00, 0x13, 0x3e, 0xd0, 0x00, 0x03, 0x8a, 0x0e, 0xde, 0xef, 0x34, 0xb4, 0xbd, 0x62,
    0xac, 0x09, 0x41, 0x98, 0x6f, 0x33, 0x36, 0x0b, 0x98, 0x00,
];

fn padding(n: usize) -> Vec<u8> {
    vec![0xff; n]
}

#[test]
fn frames_forwarded_in_detection_order() {
    let mut burst = b"noise".to_vec();
    burst.extend_from_slice(&ACK_ACK);
    burst.extend_from_slice(GNTXT);
    burst.extend_from_slice(&RTCM_1005);
    let input = BurstInput::new([burst]);
    let device = MockDevice::with_reads([padding(4)]);
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, BridgeConfig::default()).unwrap();

    let stats = bridge.poll_once().unwrap();
    assert_eq!(stats.frames_forwarded, 3);
    assert_eq!(stats.device_bytes, 0);
    assert_eq!(
        bridge.device().writes,
        vec![ACK_ACK.to_vec(), GNTXT.to_vec(), RTCM_1005.to_vec()]
    );
    assert!(bridge.output().is_empty());
}

#[test]
fn frame_split_across_cycles_is_forwarded_whole() {
    let input = BurstInput::new([GNTXT[..10].to_vec(), vec![], GNTXT[10..].to_vec()]);
    let device = MockDevice::with_reads([padding(8), padding(8), padding(8)]);
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, BridgeConfig::default()).unwrap();

    assert_eq!(bridge.poll_once().unwrap().frames_forwarded, 0);
    assert_eq!(bridge.poll_once().unwrap().frames_forwarded, 0);
    assert!(bridge.device().writes.is_empty());
    assert_eq!(bridge.poll_once().unwrap().frames_forwarded, 1);
    assert_eq!(bridge.device().writes, vec![GNTXT.to_vec()]);
}

#[test]
fn device_output_relayed_without_padding() {
    let input = BurstInput::new([vec![], vec![]]);
    let device = MockDevice::with_reads([vec![0xff, 0x41, 0xff, 0x42], vec![0x24, 0xff, 0x0a]]);
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, BridgeConfig::default()).unwrap();

    assert_eq!(
        bridge.poll_once().unwrap(),
        CycleStats {
            device_bytes: 2,
            ..Default::default()
        }
    );
    assert_eq!(bridge.output(), &vec![0x41, 0x42]);
    bridge.poll_once().unwrap();
    assert_eq!(bridge.output(), &vec![0x41, 0x42, 0x24, 0x0a]);
}

#[test]
fn drained_device_stops_forwarding() {
    let input = BurstInput::new([ACK_ACK.to_vec(), GNTXT.to_vec(), RTCM_1005.to_vec()]);
    // Only the first cycle gets an answer, the second read returns nothing.
    let device = MockDevice::with_reads([vec![0x41]]);
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, BridgeConfig::default()).unwrap();

    let err = match bridge.run() {
        Ok(never) => match never {},
        Err(e) => e,
    };
    assert!(matches!(err, BridgeError::DeviceDrained));
    assert_eq!(bridge.cycles(), 1);

    let (_, output, device) = bridge.into_parts();
    assert_eq!(output, vec![0x41]);
    // The third burst is never read.
    assert_eq!(device.writes, vec![ACK_ACK.to_vec(), GNTXT.to_vec()]);
}

#[test]
fn short_write_is_fatal_in_strict_mode() {
    let input = BurstInput::new([ACK_ACK.to_vec()]);
    let mut device = MockDevice::with_reads([padding(1)]);
    device.write_limit = Some(4);
    let config = BridgeConfig {
        write_check: WriteCheck::Strict,
        ..Default::default()
    };
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, config).unwrap();
    assert!(matches!(
        bridge.poll_once(),
        Err(BridgeError::ShortWrite {
            written: 4,
            expected: 10,
            ..
        })
    ));
}

#[test]
fn short_write_is_counted_in_warn_mode() {
    let input = BurstInput::new([[ACK_ACK, ACK_ACK].concat()]);
    let mut device = MockDevice::with_reads([padding(1)]);
    device.write_limit = Some(4);
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, BridgeConfig::default()).unwrap();
    let stats = bridge.poll_once().unwrap();
    assert_eq!(stats.frames_forwarded, 0);
    assert_eq!(stats.forward_failures, 2);
}

#[test]
fn short_write_is_ignored_when_unchecked() {
    let input = BurstInput::new([ACK_ACK.to_vec()]);
    let mut device = MockDevice::with_reads([padding(1)]);
    device.write_limit = Some(4);
    let config = BridgeConfig {
        write_check: WriteCheck::Unchecked,
        ..Default::default()
    };
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, config).unwrap();
    assert_eq!(bridge.poll_once().unwrap().frames_forwarded, 1);
}

#[test]
fn host_read_failure_is_fatal() {
    let device = MockDevice::with_reads([padding(1)]);
    let mut bridge =
        Bridge::new(FailingInput, Vec::<u8>::new(), device, BridgeConfig::default()).unwrap();
    assert!(matches!(bridge.poll_once(), Err(BridgeError::HostRead(_))));
}

#[test]
fn host_write_failure_is_fatal() {
    let device = MockDevice::with_reads([vec![0x41]]);
    let mut bridge =
        Bridge::new(BurstInput::default(), BrokenOutput, device, BridgeConfig::default()).unwrap();
    assert!(matches!(bridge.poll_once(), Err(BridgeError::HostWrite(_))));
}

#[test]
fn busy_host_output_is_retried() {
    let device = MockDevice::with_reads([vec![0x41]]);
    let mut bridge = Bridge::new(
        BurstInput::default(),
        BusyOutput::new(1, usize::MAX),
        device,
        BridgeConfig::default(),
    )
    .unwrap();
    assert_eq!(bridge.poll_once().unwrap().device_bytes, 1);
    assert_eq!(bridge.output().data, vec![0x41]);
    assert_eq!(bridge.output().flushes, 1);
}

#[test]
fn partial_host_writes_resume_where_they_stopped() {
    let device = MockDevice::with_reads([vec![0xff, 1, 2, 0xff, 3, 4, 5, 6, 7]]);
    let mut bridge = Bridge::new(
        BurstInput::default(),
        BusyOutput::new(3, 2),
        device,
        BridgeConfig::default(),
    )
    .unwrap();
    assert_eq!(bridge.poll_once().unwrap().device_bytes, 7);
    assert_eq!(bridge.output().data, vec![1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn chunk_size_bounds_each_device_read() {
    let device = MockDevice::with_reads([vec![1, 2, 3, 4, 5, 6]]);
    let config = BridgeConfig {
        chunk_size: 4,
        ..Default::default()
    };
    let mut bridge = Bridge::new(BurstInput::default(), Vec::<u8>::new(), device, config).unwrap();
    assert_eq!(bridge.poll_once().unwrap().device_bytes, 4);
    assert_eq!(bridge.output(), &vec![1, 2, 3, 4]);
}

#[test]
fn reference_rtcm_framing_reaches_the_bridge() {
    let config = BridgeConfig {
        rtcm_framing: RtcmFraming::Reference,
        ..Default::default()
    };
    // Reserved bits set, only accepted in reference mode: 0x04 0x00 is 1024 bytes.
    let mut frame = vec![0xd3, 0x04, 0x00];
    frame.extend(vec![0u8; 1024]);
    frame.extend_from_slice(&[1, 2, 3]);
    let input = BurstInput::new([frame.clone()]);
    let device = MockDevice::with_reads([padding(1)]);
    let mut bridge = Bridge::new(input, Vec::<u8>::new(), device, config).unwrap();
    assert_eq!(bridge.poll_once().unwrap().frames_forwarded, 1);
    assert_eq!(bridge.device().writes, vec![frame]);
    assert_eq!(bridge.detector_stats().rtcm_frames, 1);
}

proptest! {
    #[test]
    fn padding_never_reaches_host(reads in prop::collection::vec(
        prop::collection::vec(prop_oneof![Just(0xffu8), any::<u8>()], 1..64),
        1..8,
    )) {
        let expected: Vec<u8> = reads.iter().flatten().copied().filter(|&b| b != 0xff).collect();
        let cycles = reads.len();
        let device = MockDevice::with_reads(reads);
        let mut bridge = Bridge::new(
            BurstInput::default(),
            Vec::<u8>::new(),
            device,
            BridgeConfig::default(),
        )
        .unwrap();
        for _ in 0..cycles {
            bridge.poll_once().unwrap();
        }
        prop_assert!(matches!(bridge.poll_once(), Err(BridgeError::DeviceDrained)));
        prop_assert_eq!(bridge.output(), &expected);
    }
}
