use anyhow::{Context, Result};
use log::info;
use ublox_i2c_bridge::{Bridge, BridgeError};

mod cli;
mod host;
mod i2c;
mod logging;

fn main() -> Result<()> {
    let matches = cli::CommandBuilder::default().build().get_matches();
    let args = cli::BridgeArgs::from_matches(&matches)?;
    logging::initialize(args.verbosity);

    let device = i2c::I2cDevice::open(&args.device, args.address)?;
    let (input, output) = host::open(args.host_port.as_deref(), args.host_baud)?;
    info!(
        "Bridging to {} at 0x{:02x}, {:?}",
        device.path().display(),
        device.address(),
        args.config
    );

    let mut bridge = Bridge::new(input, output, device, args.config)?;
    let err = match bridge.run() {
        Ok(never) => match never {},
        Err(e) => e,
    };
    let context = match err {
        BridgeError::DeviceDrained | BridgeError::Read(_) => "Could not read from device",
        _ => "Bridge stopped on device",
    };
    Err(err).with_context(|| {
        format!(
            "{context} {}, address 0x{:02x}",
            args.device.display(),
            args.address
        )
    })
}
