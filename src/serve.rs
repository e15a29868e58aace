//! Purpose: Provide the HTTP/JSON transport for a web-view application shell.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum-based loopback server exposing `POST /v0/invoke/:command`.
//! Invariants: Known commands answer 200 with their envelope, even when the statement fails.
//! Invariants: Bridge errors use `{"error": {...}}` with 400/404/500 statuses.
//! Invariants: One session is shared by all requests; invocations are serialized by a mutex.
//! Invariants: Loopback-only unless explicitly allowed.

use axum::extract::{DefaultBodyLimit, Path as AxumPath, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{Value, json};
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use sqlbridge::api::{BridgeConfig, Error, ErrorKind, SharedBackend};
use sqlbridge::bridge::{BridgeRouter, error_envelope};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub bridge: BridgeConfig,
    pub allow_non_loopback: bool,
    pub cors_allowed_origins: Vec<String>,
    pub max_body_bytes: u64,
}

struct AppState {
    router: Mutex<BridgeRouter<SharedBackend>>,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    let cors_origins = validate_config(&config)?;

    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;

    let backend = config.bridge.build_backend()?;
    let backend_name = backend.name();
    let state = Arc::new(AppState {
        router: Mutex::new(BridgeRouter::new(backend)),
    });

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v0/invoke/:command", post(invoke))
        .layer(DefaultBodyLimit::max(max_body_bytes));
    if !cors_origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        );
    }
    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    info!(bind = %config.bind, backend = backend_name, "bridge listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            info!("shutdown requested");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

/// Checks the config and returns the parsed CORS allow-list.
fn validate_config(config: &ServeConfig) -> Result<Vec<HeaderValue>, Error> {
    config.bridge.validate()?;

    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }

    if config.max_body_bytes > usize::MAX as u64 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory."));
    }

    config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("wildcard CORS origin is not allowed")
                    .with_hint("List each web-view origin, e.g. --cors-origin tauri://localhost."));
            }
            HeaderValue::from_str(origin).map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("invalid CORS origin: {origin}"))
                    .with_source(err)
            })
        })
        .collect()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn healthz() -> Response {
    json_response(json!({ "ok": true }))
}

async fn invoke(
    State(state): State<Arc<AppState>>,
    AxumPath(command): AxumPath<String>,
    body: Bytes,
) -> Response {
    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(err) => return error_response(err),
    };
    let result = {
        let mut router = state
            .router
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        router.invoke(&command, payload)
    };
    match result {
        Ok(envelope) => json_response(envelope),
        Err(err) => error_response(err),
    }
}

fn parse_body(body: &[u8]) -> Result<Option<Value>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid json body")
            .with_source(err)
    })
}

fn json_response(payload: Value) -> Response {
    let mut response = Json(payload).into_response();
    response
        .headers_mut()
        .insert("sqlbridge-version", HeaderValue::from_static("0"));
    response
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Execution | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let mut response = (status, Json(error_envelope(&err))).into_response();
    response
        .headers_mut()
        .insert("sqlbridge-version", HeaderValue::from_static("0"));
    response
}

#[cfg(test)]
mod tests {
    use super::{ServeConfig, parse_body, serve, validate_config};
    use sqlbridge::api::{BridgeConfig, ErrorKind};

    fn config(bind: &str) -> ServeConfig {
        ServeConfig {
            bind: bind.parse().expect("bind"),
            bridge: BridgeConfig::default(),
            allow_non_loopback: false,
            cors_allowed_origins: Vec::new(),
            max_body_bytes: 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn serve_rejects_non_loopback_bind() {
        let err = serve(config("0.0.0.0:0"))
            .await
            .expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn non_loopback_is_allowed_with_flag() {
        let mut config = config("0.0.0.0:0");
        config.allow_non_loopback = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_body_limit_is_rejected() {
        let mut config = config("127.0.0.1:0");
        config.max_body_bytes = 0;
        let err = validate_config(&config).expect_err("usage");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn cors_origins_parse_and_reject_wildcard() {
        let mut config = config("127.0.0.1:0");
        config.cors_allowed_origins = vec![
            "tauri://localhost".to_string(),
            "http://localhost:1420".to_string(),
        ];
        assert_eq!(validate_config(&config).expect("origins").len(), 2);

        config.cors_allowed_origins = vec!["*".to_string()];
        let err = validate_config(&config).expect_err("wildcard");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn blank_body_means_no_payload() {
        assert_eq!(parse_body(b"").expect("empty"), None);
        assert_eq!(parse_body(b" \n").expect("blank"), None);
        assert!(parse_body(b"{\"query\":\"SELECT 1\"}").expect("json").is_some());
        let err = parse_body(b"{oops").expect_err("invalid");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
