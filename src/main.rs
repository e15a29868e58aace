//! Purpose: `sqlbridge` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Command envelopes go to stdout; diagnostics and logs go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::net::SocketAddr;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod serve;
mod stdio;

use sqlbridge::api::{BackendKind, BridgeConfig, DEFAULT_MAX_ROWS, Error, ErrorKind, to_exit_code};
use sqlbridge::bridge::ErrorBody;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `sqlbridge --help`."));
            }
        },
    };

    let config = BridgeConfig {
        backend: cli.backend.into(),
        max_rows: cli.max_rows,
    };
    config.validate()?;

    command_dispatch::dispatch_command(cli.command, config)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
}

#[derive(Parser)]
#[command(
    name = "sqlbridge",
    version,
    about = "SQL-shaped command bridge (ping/execute/query) for web-view application shells",
    long_about = None,
    before_help = r#"Statements run against an in-memory mock table, not a real database.

Mental model:
  - `execute` runs a statement (CREATE TABLE resets, INSERT INTO appends)
  - `query` reads rows back (SELECT)
  - `stdio` / `serve` keep one session alive for a host application
"#,
    after_help = r#"EXAMPLES
  $ sqlbridge ping hello
  $ sqlbridge query "SELECT * FROM users"
  $ sqlbridge query "SELECT * FROM users" \
      --setup "CREATE TABLE users (id INT, name TEXT, email TEXT)" \
      --setup "INSERT INTO users VALUES (1, 'Ada', 'ada@example.com')"
  $ echo '{"id":1,"cmd":"ping","payload":{"value":"hi"}}' | sqlbridge stdio
  $ sqlbridge serve --bind 127.0.0.1:9710"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "mock",
        value_enum,
        help = "Statement backend: mock|echo"
    )]
    backend: BackendCli,
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_ROWS,
        help = "Maximum rows held by the session store; an INSERT past it returns a success=false envelope"
    )]
    max_rows: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BackendCli {
    Mock,
    Echo,
}

impl From<BackendCli> for BackendKind {
    fn from(value: BackendCli) -> Self {
        match value {
            BackendCli::Mock => BackendKind::Mock,
            BackendCli::Echo => BackendKind::Echo,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Echo a value through the bridge")]
    Ping {
        #[arg(help = "Value to echo (default: empty)")]
        value: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Execute a statement and print the execute envelope",
        after_help = r#"EXAMPLES
  $ sqlbridge execute "CREATE TABLE users (id INT, name TEXT, email TEXT)"
  $ sqlbridge execute "INSERT INTO users VALUES (1, 'Ada', 'ada@example.com')"

NOTES
  - Each invocation starts a fresh session; use --setup to prepare it
  - A failed statement prints its envelope and exits with code 4"#
    )]
    Execute {
        #[arg(help = "Statement text")]
        query: String,
        #[arg(long, help = "Statement executed first on the same session (repeatable)")]
        setup: Vec<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Run a query and print the query envelope",
        after_help = r#"EXAMPLES
  $ sqlbridge query "SELECT * FROM users"
  $ sqlbridge query "SELECT * FROM users" --setup "INSERT INTO users VALUES (1, 'A', 'a@x')"

NOTES
  - An empty session answers SELECT with two sample rows"#
    )]
    Query {
        #[arg(help = "Query text")]
        query: String,
        #[arg(long, help = "Statement executed first on the same session (repeatable)")]
        setup: Vec<String>,
    },
    #[command(
        about = "Serve newline-delimited JSON invocations on stdin/stdout",
        long_about = r#"Serve invocations over stdio, one JSON object per line.

Request:  {"id": 1, "cmd": "execute", "payload": {"query": "CREATE TABLE t"}}
Response: {"id": 1, "result": {"success": true, ...}}
Errors:   {"id": 1, "error": {"kind": "NotFound", "message": "..."}}"#
    )]
    Stdio,
    #[command(about = "Serve the bridge over HTTP for a web-view shell")]
    Serve(ServeArgs),
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

#[derive(clap::Args)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:9710", help = "Bind address")]
    bind: String,
    #[arg(long, help = "Allow binding to a non-loopback address")]
    allow_non_loopback: bool,
    #[arg(
        long = "cors-origin",
        help = "Allowed browser origin for CORS (repeatable, e.g. tauri://localhost)"
    )]
    cors_origins: Vec<String>,
    #[arg(long, default_value_t = 1024 * 1024, help = "Maximum request body size")]
    max_body_bytes: u64,
}

impl ServeArgs {
    fn into_config(self, bridge: BridgeConfig) -> Result<serve::ServeConfig, Error> {
        let bind: SocketAddr = self.bind.parse().map_err(|_| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid bind address")
                .with_hint("Use a host:port value like 127.0.0.1:9710.")
        })?;
        Ok(serve::ServeConfig {
            bind,
            bridge,
            allow_non_loopback: self.allow_non_loopback,
            cors_allowed_origins: self.cors_origins,
            max_body_bytes: self.max_body_bytes,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() || err.kind() != ErrorKind::Io {
        return err;
    }
    err.with_hint("I/O error. Check that stdin/stdout are open and the bind address is free.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share the invocation if it persists.",
    )
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("sqlbridge {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "sqlbridge",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let mut value = json!({ "error": ErrorBody::from_error(err) });
    let causes = error_causes(err);
    if !causes.is_empty() {
        value["error"]["causes"] = json!(causes);
    }
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", err.description())];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(cause) = error_causes(err).first() {
        if err.message().is_some() {
            lines.push(format!("caused by: {cause}"));
        }
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
