use anyhow::{anyhow, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use std::path::PathBuf;
use ublox_i2c_bridge::{constants::DEFAULT_CHUNK_SIZE, BridgeConfig, RtcmFraming, WriteCheck};

/// Lowest and highest non-reserved 7-bit I2C addresses.
pub const I2C_ADDRESS_MIN: u16 = 0x03;
pub const I2C_ADDRESS_MAX: u16 = 0x77;

pub struct CommandBuilder {
    command: clap::Command,
}

/// Everything the bridge needs from the command line.
#[derive(Debug)]
pub struct BridgeArgs {
    pub device: PathBuf,
    pub address: u16,
    pub host_port: Option<String>,
    pub host_baud: u32,
    pub verbosity: u8,
    pub config: BridgeConfig,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        let command = clap::Command::new("ublox-i2c-bridge")
            .author(clap::crate_authors!())
            .version(clap::crate_version!())
            .about("Forwards UBX, NMEA and RTCM3 frames to a u-blox receiver on an I2C bus and relays its output back")
            .arg_required_else_help(true)
            .arg(
                Arg::new("device")
                    .value_name("device")
                    .required(true)
                    .value_parser(value_parser!(PathBuf))
                    .help("I2C bus device, e.g. /dev/i2c-1"),
            )
            .arg(
                Arg::new("address")
                    .value_name("address")
                    .required(true)
                    .value_parser(parse_address)
                    .help("7-bit slave address of the receiver, decimal or 0x prefixed hex"),
            )
            .arg(
                Arg::new("chunk-size")
                    .long("chunk-size")
                    .value_name("bytes")
                    .value_parser(value_parser!(usize))
                    .help("Maximum number of bytes read from the device per cycle [default: 255]"),
            )
            .arg(
                Arg::new("write-check")
                    .long("write-check")
                    .value_parser(["unchecked", "warn", "strict"])
                    .default_value("warn")
                    .help("What to do when the device does not accept a whole frame"),
            )
            .arg(
                Arg::new("rtcm-framing")
                    .long("rtcm-framing")
                    .value_parser(["standard", "reference"])
                    .default_value("standard")
                    .long_help(
                        "RTCM3 header handling. 'standard' requires the 6 reserved bits to be zero and uses a 10-bit length, 'reference' uses the whole second and third header bytes as length",
                    ),
            )
            .arg(
                Arg::new("host-port")
                    .long("host-port")
                    .value_name("port")
                    .help("Serial port to use as the host channel instead of stdin/stdout"),
            )
            .arg(
                Arg::new("host-baud")
                    .long("host-baud")
                    .value_name("baud")
                    .default_value("9600")
                    .value_parser(value_parser!(u32))
                    .requires("host-port")
                    .help("Baud rate for the host serial port"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .help("Increase log verbosity on stderr, may be repeated"),
            );
        Self { command }
    }

    pub fn build(&self) -> clap::Command {
        self.command.clone()
    }
}

impl BridgeArgs {
    pub fn from_matches(cli: &ArgMatches) -> Result<Self> {
        let device = cli
            .get_one::<PathBuf>("device")
            .cloned()
            .ok_or_else(|| anyhow!("Missing I2C device argument"))?;
        let address = cli
            .get_one::<u16>("address")
            .copied()
            .ok_or_else(|| anyhow!("Missing I2C address argument"))?;

        let chunk_size = cli
            .get_one::<usize>("chunk-size")
            .copied()
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let write_check = match cli.get_one::<String>("write-check") {
            Some(s) => s.parse::<WriteCheck>().map_err(|e| anyhow!(e))?,
            None => WriteCheck::default(),
        };
        let rtcm_framing = match cli.get_one::<String>("rtcm-framing") {
            Some(s) => s.parse::<RtcmFraming>().map_err(|e| anyhow!(e))?,
            None => RtcmFraming::default(),
        };
        let config = BridgeConfig {
            chunk_size,
            write_check,
            rtcm_framing,
        };
        config.validate()?;

        Ok(Self {
            device,
            address,
            host_port: cli.get_one::<String>("host-port").cloned(),
            host_baud: cli.get_one::<u32>("host-baud").copied().unwrap_or(9600),
            verbosity: cli.get_count("verbose"),
            config,
        })
    }
}

/// Accepts decimal or `0x`/`0X` prefixed hex within the usable 7-bit range.
pub fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    match parsed {
        Ok(address) if (I2C_ADDRESS_MIN..=I2C_ADDRESS_MAX).contains(&address) => Ok(address),
        _ => Err(format!("Wrong I2C device address {s}")),
    }
}
