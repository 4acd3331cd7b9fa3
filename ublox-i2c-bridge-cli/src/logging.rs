use log::LevelFilter;

pub const LOG_ENV: &str = "UBLOX_I2C_BRIDGE_LOG";

/// Log records always go to stderr, stdout carries the receiver output.
///
/// `warn` unless `UBLOX_I2C_BRIDGE_LOG` or `RUST_LOG` say otherwise, `-v` flags
/// override both.
pub fn initialize(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .filter_level(LevelFilter::Warn)
        .parse_env(LOG_ENV)
        .parse_env("RUST_LOG");
    if verbosity > 0 {
        builder.filter_level(verbosity_level(verbosity));
    }
    builder.init();
}

fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
