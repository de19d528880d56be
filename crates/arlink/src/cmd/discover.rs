use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use arlink_discovery::{Discovery, DiscoveryEvent, MdnsSource};
use tokio_util::sync::CancellationToken;

use crate::cmd::{build_runtime, parse_duration, DiscoverArgs};
use crate::exit::{discovery_error, CliResult, SUCCESS};
use crate::output::{print_devices, print_event, FoundDevice, OutputFormat};

pub fn run(args: DiscoverArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let runtime = build_runtime()?;
    runtime.block_on(browse(timeout, format))
}

async fn browse(timeout: Duration, format: OutputFormat) -> CliResult<i32> {
    let source = MdnsSource::new().map_err(|err| discovery_error("mdns setup failed", err))?;
    let cancel = CancellationToken::new();
    let mut events = Discovery::spawn(source, cancel.clone());

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut devices: BTreeMap<IpAddr, FoundDevice> = BTreeMap::new();
    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        print_event(&event, format);
        match event {
            DiscoveryEvent::Found {
                name,
                address,
                port,
            } => {
                devices.insert(
                    address,
                    FoundDevice {
                        name,
                        address,
                        port,
                    },
                );
            }
            DiscoveryEvent::Lost { address } => {
                devices.remove(&address);
            }
        }
    }
    cancel.cancel();

    let devices: Vec<FoundDevice> = devices.into_values().collect();
    print_devices(&devices, format);
    Ok(SUCCESS)
}
