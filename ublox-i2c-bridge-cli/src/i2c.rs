use anyhow::{bail, Context, Result};
use log::debug;
use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use ublox_i2c_bridge::constants::DATA_STREAM_REGISTER;

/// `I2C_SLAVE` request from `linux/i2c-dev.h`.
#[cfg(target_os = "linux")]
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// A receiver on an I2C bus, selected through the kernel i2c-dev interface.
///
/// Once opened, reads and writes go straight to the receiver's data stream
/// register.
pub struct I2cDevice {
    file: File,
    path: PathBuf,
    address: u16,
}

impl I2cDevice {
    /// Opens the bus, binds it to `address` and points the register pointer at
    /// the data stream.
    pub fn open(path: &Path, address: u16) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Could not open the I2C device {}", path.display()))?;

        set_slave_address(&file, address)
            .with_context(|| format!("Could not set I2C device address 0x{address:02x}"))?;

        let mut device = Self {
            file,
            path: path.to_path_buf(),
            address,
        };
        device
            .select_data_stream()
            .context("Failed to write i2c register address")?;
        debug!("Opened {} at address 0x{:02x}", path.display(), address);
        Ok(device)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    fn select_data_stream(&mut self) -> Result<()> {
        let written = self.file.write(&[DATA_STREAM_REGISTER])?;
        if written != 1 {
            bail!("{written} bytes written");
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn set_slave_address(file: &File, address: u16) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: the descriptor is open for the lifetime of `file` and I2C_SLAVE
    // takes the address by value, no memory is shared with the kernel.
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, libc::c_ulong::from(address)) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_slave_address(_file: &File, _address: u16) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "i2c-dev is only available on Linux",
    ))
}

impl Read for I2cDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for I2cDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
