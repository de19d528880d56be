use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use arlink_session::{Session, SessionConfig};
use clap::{Args, Subcommand};

use crate::exit::{io_error, session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod command;
pub mod discover;
pub mod monitor;
pub mod version;

/// Control port devices listen on for the connection handshake.
pub const DEFAULT_CONTROL_PORT: u16 = 44444;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse the local network for devices.
    Discover(DiscoverArgs),
    /// Connect to a device and print its state as it changes.
    Monitor(MonitorArgs),
    /// Connect to a device and send one piloting command.
    Command(CommandArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Discover(args) => discover::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Command(args) => command::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// How long to browse before printing results (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

/// Where and how to reach a device.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Device IP address.
    pub addr: IpAddr,
    /// Device control port.
    #[arg(long, default_value_t = DEFAULT_CONTROL_PORT)]
    pub port: u16,
    /// Handshake timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    /// Name announced to the device during the handshake.
    #[arg(long, env = "ARLINK_CONTROLLER_NAME", default_value = "arlink")]
    pub controller_name: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Stop after this long instead of waiting for Ctrl-C (e.g. 30s).
    #[arg(long)]
    pub duration: Option<String>,
    /// Minimum time between printed snapshots (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct CommandArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Action {
    /// Take off.
    Takeoff,
    /// Land.
    Land,
    /// Cut the motors immediately.
    Emergency,
    /// Set the maximum distance from home, in meters.
    MaxDistance {
        meters: f32,
    },
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn build_runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))
}

pub(crate) async fn connect(args: &ConnectArgs) -> CliResult<Session> {
    let timeout = parse_duration(&args.connect_timeout)?;
    let mut config = SessionConfig::default();
    config.handshake.timeout = timeout;
    config.handshake.controller_name = args.controller_name.clone();

    let addr = SocketAddr::new(args.addr, args.port);
    Session::connect_with_config(addr, config)
        .await
        .map_err(|err| session_error("connect failed", err))
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(value) = input.strip_suffix("ms") {
        (value, true)
    } else if let Some(value) = input.strip_suffix('s') {
        (value, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
    }

    #[test]
    fn rejects_bad_durations() {
        for input in ["", "0", "0ms", "fast", "-1s"] {
            let err = parse_duration(input).unwrap_err();
            assert_eq!(err.code, USAGE, "input {input:?}");
        }
    }
}
