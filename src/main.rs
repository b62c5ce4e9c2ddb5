//! Entry point for the `machine` command.
use std::process::ExitCode;

use clap::Parser;
use machine_profiles::{
    cli::{self, MachineArgs, RuntimeExit},
    lib::telemetry::{self, OperationSpan},
};
use tracing::Instrument;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = MachineArgs::parse();

    let operation = OperationSpan::start(
        args.command.as_str(),
        args.global.region.as_deref().unwrap_or(""),
        args.command.profile_name(),
    );
    let span = operation.span().clone();
    let result = cli::run(args).instrument(span).await;
    operation.finish(if result.is_ok() { "ok" } else { "error" });

    let message = result.map_err(RuntimeExit::from_error)?;
    println!("{message}");
    Ok(())
}
