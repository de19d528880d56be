use arlink_command::catalog::ardrone3::{Emergency, Landing, MaxDistance, TakeOff};
use arlink_command::DecodeCommand;
use arlink_session::profile::bebop;
use arlink_session::Session;

use crate::cmd::{build_runtime, connect, Action, CommandArgs};
use crate::exit::{session_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_ack, OutputFormat};

pub fn run(args: CommandArgs, format: OutputFormat) -> CliResult<i32> {
    let runtime = build_runtime()?;
    runtime.block_on(execute(args, format))
}

async fn execute(args: CommandArgs, format: OutputFormat) -> CliResult<i32> {
    let session = connect(&args.connect).await?;

    let outcome = tokio::select! {
        result = perform(&session, args.action) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    session.close().await;

    let Some(result) = outcome else {
        return Err(CliError::new(FAILURE, "interrupted"));
    };
    let acknowledged = result.map_err(|err| session_error("send failed", err))?;
    print_ack(action_name(args.action), acknowledged, format);

    Ok(if acknowledged { SUCCESS } else { TIMEOUT })
}

async fn perform(session: &Session, action: Action) -> arlink_session::Result<bool> {
    match action {
        Action::Takeoff => bebop::take_off(session).await,
        Action::Land => bebop::land(session).await,
        Action::Emergency => bebop::emergency(session).await,
        Action::MaxDistance { meters } => bebop::set_max_distance(session, meters).await,
    }
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Takeoff => TakeOff::NAME,
        Action::Land => Landing::NAME,
        Action::Emergency => Emergency::NAME,
        Action::MaxDistance { .. } => MaxDistance::NAME,
    }
}
