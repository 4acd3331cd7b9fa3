use anyhow::{Context, Result};
use log::info;
use std::{io, time::Duration};
use ublox_i2c_bridge::{HostInput, NonBlocking};

pub type HostChannels = (Box<dyn HostInput>, Box<dyn io::Write>);

/// Opens the host side of the bridge: the given serial port, or stdin/stdout
/// when there is none.
pub fn open(port: Option<&str>, baud: u32) -> Result<HostChannels> {
    match port {
        Some(port) => serial(port, baud),
        None => stdio(),
    }
}

fn serial(port: &str, baud: u32) -> Result<HostChannels> {
    // A zero timeout makes reads return immediately when nothing is pending.
    let input = serialport::new(port, baud)
        .timeout(Duration::ZERO)
        .open()
        .with_context(|| format!("Failed to open port: {port}"))?;
    let output = input
        .try_clone()
        .with_context(|| format!("Failed to clone port: {port}"))?;
    info!("Host channel on {port} at {baud} baud");
    let input: Box<dyn HostInput> = Box::new(NonBlocking::new(input));
    let output: Box<dyn io::Write> = Box::new(output);
    Ok((input, output))
}

fn stdio() -> Result<HostChannels> {
    let stdin = io::stdin();
    set_nonblocking(&stdin).context("Could not make stdin non-blocking")?;
    info!("Host channel on stdin/stdout");
    let input: Box<dyn HostInput> = Box::new(NonBlocking::new(stdin.lock()));
    let output: Box<dyn io::Write> = Box::new(io::stdout().lock());
    Ok((input, output))
}

#[cfg(unix)]
fn set_nonblocking(fd: &impl std::os::fd::AsRawFd) -> io::Result<()> {
    let fd = fd.as_raw_fd();
    // SAFETY: fcntl with F_GETFL/F_SETFL only reads and updates the status
    // flags of a descriptor owned by this process.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_nonblocking<T>(_fd: &T) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "non-blocking stdin needs a unix host",
    ))
}
