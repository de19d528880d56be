use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::cmd::{build_runtime, connect, parse_duration, MonitorArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_state, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = args.duration.as_deref().map(parse_duration).transpose()?;
    let interval = parse_duration(&args.interval)?;
    let runtime = build_runtime()?;
    runtime.block_on(watch(args, duration, interval, format))
}

async fn watch(
    args: MonitorArgs,
    duration: Option<Duration>,
    interval: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let session = connect(&args.connect).await?;
    let mut states = session.watch_state();
    let mut commands = session.subscribe_commands();

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    // Telemetry changes several times a second; print at most once per tick.
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            _ = ticker.tick() => match states.has_changed() {
                Ok(true) => {
                    let snapshot = states.borrow_and_update().clone();
                    print_state(&snapshot, format);
                }
                Ok(false) => {}
                Err(_) => break,
            },
            received = commands.recv() => match received {
                Ok(command) => debug!(command = command.name(), "received"),
                Err(RecvError::Lagged(missed)) => warn!(missed, "command stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    let last = session.state();
    session.close().await;
    print_state(&last, format);
    Ok(SUCCESS)
}
