//! Purpose: Typed HTTP client for a running `sqlbridge serve` instance.
//! Exports: `RemoteClient`.
//! Role: Mirrors the web-view client wrappers (`ping`, `execute`, `query`) in Rust.
//! Invariants: Base URLs are http(s) with no path; commands post to `/v0/invoke/<cmd>`.
//! Invariants: `ping` maps an empty or missing echo to `None`.
//! Invariants: Server error envelopes come back as `Error` with the same kind.
#![allow(clippy::result_large_err)]

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

use super::models::{ExecuteResponse, PingResponse, QueryResponse};
use crate::bridge::ErrorEnvelope;
use crate::core::error::{Error, ErrorKind};

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    base_url: Url,
    agent: ureq::Agent,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RemoteClientInner { base_url, agent }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn health(&self) -> ApiResult<bool> {
        let url = build_url(&self.inner.base_url, &["healthz"])?;
        let response = self
            .inner
            .agent
            .get(url.as_str())
            .set("Accept", "application/json")
            .call();
        let value: Value = match response {
            Ok(resp) => read_json_response(resp)?,
            Err(ureq::Error::Status(code, resp)) => return Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("request failed")
                    .with_source(err));
            }
        };
        Ok(value.get("ok").and_then(Value::as_bool).unwrap_or(false))
    }

    pub fn ping(&self, value: &str) -> ApiResult<Option<String>> {
        let response: PingResponse = self.invoke("ping", &json!({ "value": value }))?;
        Ok(non_empty(response.value))
    }

    pub fn execute(&self, query: &str) -> ApiResult<ExecuteResponse> {
        self.invoke("execute", &json!({ "query": query }))
    }

    pub fn query(&self, query: &str) -> ApiResult<QueryResponse> {
        self.invoke("query", &json!({ "query": query }))
    }

    pub fn invoke<T, R>(&self, command: &str, payload: &T) -> ApiResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = build_url(&self.inner.base_url, &["v0", "invoke", command])?;
        let body = serde_json::to_string(payload).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode request json")
                .with_source(err)
        })?;
        let response = self
            .inner
            .agent
            .post(url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&body);

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid bridge base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("bridge base url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("bridge base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("bridge base url cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return envelope.error.into_error();
    }
    Error::new(error_kind_from_status(status))
        .with_message(format!("bridge error status {status}"))
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 | 415 => ErrorKind::Usage,
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_url, error_kind_from_status, non_empty, normalize_base_url};
    use crate::core::error::ErrorKind;

    #[test]
    fn normalize_base_url_adds_root_path() {
        let url = normalize_base_url("http://localhost:9710".to_string()).expect("url");
        assert_eq!(url.as_str(), "http://localhost:9710/");
    }

    #[test]
    fn normalize_base_url_rejects_paths_and_schemes() {
        let err = normalize_base_url("http://localhost:9710/v0".to_string()).expect_err("path");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = normalize_base_url("tauri://localhost".to_string()).expect_err("scheme");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn invoke_url_uses_command_segment() {
        let base = normalize_base_url("http://127.0.0.1:9710".to_string()).expect("url");
        let url = build_url(&base, &["v0", "invoke", "query"]).expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9710/v0/invoke/query");
    }

    #[test]
    fn empty_ping_echo_maps_to_none() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("hi".to_string())), Some("hi".to_string()));
    }

    #[test]
    fn status_fallback_kinds() {
        assert_eq!(error_kind_from_status(400), ErrorKind::Usage);
        assert_eq!(error_kind_from_status(404), ErrorKind::NotFound);
        assert_eq!(error_kind_from_status(502), ErrorKind::Internal);
    }
}
