use std::fmt::Display;
use std::io::IsTerminal;
use std::net::IpAddr;

use arlink_discovery::DiscoveryEvent;
use arlink_session::state::Bounded;
use arlink_session::DeviceState;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A device seen during discovery.
#[derive(Debug, Clone, Serialize)]
pub struct FoundDevice {
    pub name: String,
    pub address: IpAddr,
    pub port: u16,
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Stream one discovery event. Table output waits for the summary instead.
pub fn print_event(event: &DiscoveryEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(event),
        OutputFormat::Pretty => match event {
            DiscoveryEvent::Found {
                name,
                address,
                port,
            } => println!("found {name} at {address}:{port}"),
            DiscoveryEvent::Lost { address } => println!("lost {address}"),
        },
        OutputFormat::Table => {}
    }
}

pub fn print_devices(devices: &[FoundDevice], format: OutputFormat) {
    let OutputFormat::Table = format else {
        return;
    };
    let mut table = new_table(vec!["NAME", "ADDRESS", "PORT"]);
    for device in devices {
        table.add_row(vec![
            device.name.clone(),
            device.address.to_string(),
            device.port.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn print_state(state: &DeviceState, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(state),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (field, value) in state_rows(state) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = state_rows(state)
                .into_iter()
                .filter(|(_, value)| value != "-")
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

#[derive(Serialize)]
struct AckOutput<'a> {
    command: &'a str,
    acknowledged: bool,
}

pub fn print_ack(command: &str, acknowledged: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&AckOutput {
            command,
            acknowledged,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "ACKNOWLEDGED"]);
            table.add_row(vec![command.to_string(), acknowledged.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let outcome = if acknowledged {
                "acknowledged"
            } else {
                "not acknowledged"
            };
            println!("{command}: {outcome}");
        }
    }
}

fn state_rows(state: &DeviceState) -> Vec<(&'static str, String)> {
    let telemetry = &state.telemetry;
    let limits = &state.limits;
    let identity = &state.identity;
    vec![
        ("link", format!("{:?}", state.link).to_lowercase()),
        (
            "round_trip_ms",
            opt(state
                .round_trip_time
                .map(|rtt| format!("{:.1}", rtt.as_secs_f64() * 1000.0))),
        ),
        ("rssi_dbm", opt(state.rssi_dbm)),
        ("battery_percent", opt(state.battery_percent)),
        ("product", opt(identity.name.as_deref())),
        ("software", opt(identity.software_version.as_deref())),
        ("serial", opt(identity.serial_number())),
        ("flying_state", opt(telemetry.flying_state)),
        (
            "altitude_m",
            opt(telemetry.altitude_m.map(|alt| format!("{alt:.2}"))),
        ),
        (
            "position",
            opt(telemetry.position.map(|pos| {
                format!(
                    "{:.6},{:.6} @ {:.1}m",
                    pos.latitude, pos.longitude, pos.altitude_m
                )
            })),
        ),
        (
            "speed_mps",
            opt(telemetry.speed.map(|speed| {
                format!(
                    "n={:.2} e={:.2} d={:.2}",
                    speed.north_mps, speed.east_mps, speed.down_mps
                )
            })),
        ),
        (
            "attitude_rad",
            opt(telemetry.attitude.map(|att| {
                format!(
                    "roll={:.3} pitch={:.3} yaw={:.3}",
                    att.roll_rad, att.pitch_rad, att.yaw_rad
                )
            })),
        ),
        ("altitude_ceiling_m", opt(limits.altitude_ceiling_m.map(bounded))),
        ("max_distance_m", opt(limits.max_distance_m.map(bounded))),
        ("geofence", opt(limits.geofence_enabled)),
        ("home_type", opt(limits.home_type)),
        (
            "return_home_delay_s",
            opt(limits.return_home_delay.map(|delay| delay.as_secs())),
        ),
    ]
}

fn bounded(value: Bounded) -> String {
    format!("{} [{}..{}]", value.current, value.min, value.max)
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
