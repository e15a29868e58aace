//! Purpose: Hold top-level CLI command dispatch for `sqlbridge`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: One-shot commands run on a fresh session built from `BridgeConfig`.
//! Invariants: A `success = false` envelope is still printed, then exits with the Execution code.

use super::*;
use sqlbridge::api::{Dispatcher, ExecuteRequest, PingRequest, QueryRequest, SharedBackend};

pub(super) fn dispatch_command(command: Command, config: BridgeConfig) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "sqlbridge", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Ping { value } => {
            let dispatcher = Dispatcher::new(config.build_backend()?);
            let response = dispatcher.ping(PingRequest { value });
            emit_json(to_json(&response)?);
            Ok(RunOutcome::ok())
        }
        Command::Execute { query, setup } => {
            let mut dispatcher = prepared_dispatcher(&config, &setup)?;
            let response = dispatcher.execute(ExecuteRequest::new(query));
            let success = response.success;
            emit_json(to_json(&response)?);
            Ok(envelope_outcome(success))
        }
        Command::Query { query, setup } => {
            let mut dispatcher = prepared_dispatcher(&config, &setup)?;
            let response = dispatcher.query(QueryRequest::new(query));
            let success = response.success;
            emit_json(to_json(&response)?);
            Ok(envelope_outcome(success))
        }
        Command::Stdio => {
            init_tracing();
            stdio::serve(config)?;
            Ok(RunOutcome::ok())
        }
        Command::Serve(args) => {
            let config = args.into_config(config)?;
            init_tracing();
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))?;
            Ok(RunOutcome::ok())
        }
    }
}

/// Builds a dispatcher and runs `--setup` statements; a failing setup statement aborts.
fn prepared_dispatcher(
    config: &BridgeConfig,
    setup: &[String],
) -> Result<Dispatcher<SharedBackend>, Error> {
    let mut dispatcher = Dispatcher::new(config.build_backend()?);
    for (index, statement) in setup.iter().enumerate() {
        let response = dispatcher.execute(ExecuteRequest::new(statement.clone()));
        if !response.success {
            return Err(Error::new(ErrorKind::Execution)
                .with_message(format!(
                    "setup statement {} failed: {}",
                    index + 1,
                    response.message
                ))
                .with_hint("Fix the --setup statement or raise --max-rows."));
        }
    }
    Ok(dispatcher)
}

fn envelope_outcome(success: bool) -> RunOutcome {
    if success {
        RunOutcome::ok()
    } else {
        RunOutcome::with_code(to_exit_code(ErrorKind::Execution))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode envelope")
            .with_source(err)
    })
}
