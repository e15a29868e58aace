//! Purpose: Run the bridge over stdio transport.
//! Exports: `serve`.
//! Role: Feed newline-delimited JSON invocations to one `BridgeRouter` session.
//! Invariants: stdout only emits bridge responses (one JSON value per line).
//! Invariants: stdin EOF exits cleanly; blank lines are skipped.
//! Invariants: Parse/protocol errors are answered as error responses, never fatal.

use std::io::{self, BufRead, BufReader, BufWriter, Write};

use sqlbridge::api::{BridgeConfig, Error, ErrorKind};
use sqlbridge::bridge::{BridgeResponse, BridgeRouter};
use tracing::info;

pub(super) fn serve(config: BridgeConfig) -> Result<(), Error> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = BufWriter::new(stdout.lock());
    let backend = config.build_backend()?;
    info!(backend = backend.name(), "stdio bridge ready");
    let mut router = BridgeRouter::new(backend);
    let mut line = String::new();
    let mut handled: u64 = 0;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read invocation")
                .with_source(err)
        })?;
        if read == 0 {
            writer.flush().map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to flush bridge output")
                    .with_source(err)
            })?;
            info!(handled, "stdin closed; stdio bridge exiting");
            return Ok(());
        }

        let message = line.trim_end_matches(['\n', '\r']);
        if message.trim().is_empty() {
            continue;
        }

        let response = router.handle_line(message);
        handled += 1;
        write_response_line(&mut writer, &response)?;
    }
}

fn write_response_line(
    writer: &mut BufWriter<io::StdoutLock<'_>>,
    response: &BridgeResponse,
) -> Result<(), Error> {
    serde_json::to_writer(&mut *writer, response).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode bridge response")
            .with_source(err)
    })?;
    writer.write_all(b"\n").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write bridge response")
            .with_source(err)
    })?;
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush bridge response")
            .with_source(err)
    })
}
