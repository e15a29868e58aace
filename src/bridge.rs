//! Purpose: Route `(command, payload)` invocations to the typed dispatcher.
//! Key exports: `BridgeRouter`, `Invocation`, `InvocationId`, `BridgeResponse`, `ErrorBody`.
//! Role: Transport-agnostic command surface shared by stdio, HTTP, and the C ABI.
//! Invariants: Known commands always produce an envelope, even when the statement fails.
//! Invariants: Unknown commands are NotFound; malformed payloads are Usage errors.
//! Invariants: Line responses echo the request id (null when absent or unparsable).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::api::{Dispatcher, ExecuteRequest, PingRequest, QueryRequest};
use crate::core::backend::Backend;
use crate::core::error::{Error, ErrorKind};

pub const COMMANDS: [&str; 3] = ["ping", "execute", "query"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvocationId {
    String(String),
    Number(i64),
    Null,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub id: Option<InvocationId>,
    pub cmd: String,
    pub payload: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBody {
    pub fn from_error(err: &Error) -> Self {
        Self {
            kind: err.kind().label().to_string(),
            message: err.description(),
            hint: err.hint().map(str::to_string),
        }
    }

    pub fn into_error(self) -> Error {
        let mut err = Error::new(ErrorKind::from_label(&self.kind)).with_message(self.message);
        if let Some(hint) = self.hint {
            err = err.with_hint(hint);
        }
        err
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

pub fn error_envelope(err: &Error) -> Value {
    json!({ "error": ErrorBody::from_error(err) })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub id: InvocationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl BridgeResponse {
    fn success(id: InvocationId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: InvocationId, err: &Error) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorBody::from_error(err)),
        }
    }
}

pub struct BridgeRouter<B> {
    dispatcher: Dispatcher<B>,
}

impl<B: Backend> BridgeRouter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            dispatcher: Dispatcher::new(backend),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<B> {
        &mut self.dispatcher
    }

    pub fn invoke(&mut self, command: &str, payload: Option<Value>) -> Result<Value, Error> {
        debug!(command, "invoke");
        match command {
            "ping" => {
                let request: PingRequest = decode_payload(command, payload)?;
                to_value(self.dispatcher.ping(request))
            }
            "execute" => {
                let request: ExecuteRequest = decode_payload(command, payload)?;
                to_value(self.dispatcher.execute(request))
            }
            "query" => {
                let request: QueryRequest = decode_payload(command, payload)?;
                to_value(self.dispatcher.query(request))
            }
            _ => Err(Error::new(ErrorKind::NotFound)
                .with_message(format!("unknown command: {command}"))
                .with_hint(format!("Known commands: {}.", COMMANDS.join(", ")))),
        }
    }

    pub fn handle_line(&mut self, line: &str) -> BridgeResponse {
        match parse_line(line) {
            Ok(value) => self.handle_value(value),
            Err(err) => {
                warn!(error = %err, "rejected invocation line");
                BridgeResponse::failure(InvocationId::Null, &err)
            }
        }
    }

    pub fn handle_value(&mut self, value: Value) -> BridgeResponse {
        let invocation = match parse_invocation(value) {
            Ok(invocation) => invocation,
            Err((id, err)) => {
                warn!(error = %err, "rejected invocation");
                return BridgeResponse::failure(id, &err);
            }
        };
        let id = invocation.id.unwrap_or(InvocationId::Null);
        match self.invoke(&invocation.cmd, invocation.payload) {
            Ok(result) => BridgeResponse::success(id, result),
            Err(err) => {
                warn!(command = %invocation.cmd, error = %err, "invocation failed");
                BridgeResponse::failure(id, &err)
            }
        }
    }
}

pub fn parse_line(line: &str) -> Result<Value, Error> {
    serde_json::from_str::<Value>(line).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid JSON")
            .with_hint("Send one JSON object per line.")
            .with_source(err)
    })
}

pub fn parse_invocation(value: Value) -> Result<Invocation, (InvocationId, Error)> {
    let mut object = match value {
        Value::Object(object) => object,
        _ => {
            return Err((
                InvocationId::Null,
                Error::new(ErrorKind::Usage).with_message("invocation must be a JSON object"),
            ));
        }
    };

    let id = match object.remove("id") {
        Some(raw) => Some(parse_invocation_id(raw).map_err(|err| (InvocationId::Null, err))?),
        None => None,
    };
    let error_id = id.clone().unwrap_or(InvocationId::Null);

    let cmd = match object.remove("cmd") {
        Some(Value::String(cmd)) => cmd,
        _ => {
            return Err((
                error_id,
                Error::new(ErrorKind::Usage)
                    .with_message("missing string field `cmd`")
                    .with_hint("Use {\"cmd\": \"query\", \"payload\": {\"query\": \"SELECT 1\"}}."),
            ));
        }
    };

    let payload = object.remove("payload");
    Ok(Invocation { id, cmd, payload })
}

fn parse_invocation_id(value: Value) -> Result<InvocationId, Error> {
    match value {
        Value::String(value) => Ok(InvocationId::String(value)),
        Value::Number(value) => value.as_i64().map(InvocationId::Number).ok_or_else(|| {
            Error::new(ErrorKind::Usage).with_message("id must be an integer number")
        }),
        Value::Null => Ok(InvocationId::Null),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message("id must be a string, integer number, or null")),
    }
}

fn decode_payload<T>(command: &str, payload: Option<Value>) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    match payload {
        None | Some(Value::Null) => Ok(T::default()),
        Some(Value::Object(map)) => decode_object(command, map),
        Some(_) => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{command} payload must be a JSON object"))),
    }
}

fn decode_object<T: DeserializeOwned>(command: &str, map: Map<String, Value>) -> Result<T, Error> {
    serde_json::from_value(Value::Object(map)).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid {command} payload: {err}"))
            .with_source(err)
    })
}

fn to_value<T: Serialize>(value: T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode response")
            .with_source(err)
    })
}
