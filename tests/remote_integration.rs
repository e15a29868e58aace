//! Purpose: End-to-end tests for the HTTP bridge server and typed remote client.
//! Exports: None (integration test module).
//! Role: Validate command envelopes, session sharing, and error propagation across TCP.
//! Invariants: Uses a loopback-only server on a free port.
//! Invariants: Bounded waits avoid test flakiness.
//! Invariants: Server processes are cleaned up on drop.

use serde_json::{Value, json};
use sqlbridge::api::{ErrorKind, RemoteClient, Row};
use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::{Duration, Instant};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

static SERVER_LOCK: Mutex<()> = Mutex::new(());

struct TestServer {
    child: Child,
    base_url: String,
    _server_guard: MutexGuard<'static, ()>,
}

impl TestServer {
    fn start() -> TestResult<Self> {
        Self::start_with_args(&[])
    }

    fn start_with_args(extra: &[&str]) -> TestResult<Self> {
        let guard = SERVER_LOCK
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let mut last_err: Option<Box<dyn std::error::Error>> = None;
        for _attempt in 0..3 {
            let port = pick_port()?;
            let bind = format!("127.0.0.1:{port}");
            let base_url = format!("http://{bind}");

            let mut command = Command::new(env!("CARGO_BIN_EXE_sqlbridge"));
            command
                .args(extra)
                .arg("serve")
                .arg("--bind")
                .arg(&bind)
                .env("RUST_LOG", "warn")
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
            let mut child = command.spawn()?;

            match wait_for_server(&mut child, bind.parse()?) {
                Ok(()) => {
                    return Ok(Self {
                        child,
                        base_url,
                        _server_guard: guard,
                    });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    last_err = Some(err);
                    sleep(Duration::from_millis(30));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "server failed to start".into()))
    }

    fn client(&self) -> TestResult<RemoteClient> {
        Ok(RemoteClient::new(self.base_url.clone())?)
    }

    fn post_raw(&self, path: &str, body: &str) -> (u16, Value) {
        let url = format!("{}{path}", self.base_url);
        let result = ureq::post(&url)
            .set("Content-Type", "application/json")
            .send_string(body);
        let (status, response) = match result {
            Ok(resp) => (resp.status(), resp),
            Err(ureq::Error::Status(code, resp)) => (code, resp),
            Err(err) => panic!("transport error: {err}"),
        };
        let text = response.into_string().expect("body");
        (status, serde_json::from_str(&text).expect("json body"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn health_and_ping_round_trip() -> TestResult<()> {
    let server = TestServer::start()?;
    let client = server.client()?;

    assert!(client.health()?);
    assert_eq!(client.ping("hello")?, Some("hello".to_string()));
    assert_eq!(client.ping("")?, None);
    Ok(())
}

#[test]
fn session_persists_across_requests() -> TestResult<()> {
    let server = TestServer::start()?;
    let client = server.client()?;

    let created = client.execute("CREATE TABLE users (id INT, name TEXT, email TEXT)")?;
    assert!(created.success);
    assert_eq!(created.rows_affected, 0);

    for (name, email) in [("Ada", "ada@example.com"), ("Lin", "lin@example.com")] {
        let inserted =
            client.execute(&format!("INSERT INTO users VALUES (0, '{name}', '{email}')"))?;
        assert!(inserted.success);
        assert_eq!(inserted.rows_affected, 1);
    }

    let queried = client.query("SELECT * FROM users")?;
    assert!(queried.success);
    assert_eq!(queried.message, "Query executed successfully (mock)");
    assert_eq!(
        queried.data,
        vec![
            Row::user(1, "Ada", "ada@example.com"),
            Row::user(2, "Lin", "lin@example.com"),
        ]
    );

    client.execute("create table users")?;
    let queried = client.query("SELECT * FROM users")?;
    assert_eq!(queried.data.len(), 2);
    assert_eq!(queried.data[0], Row::user(1, "Sample User 1", "user1@example.com"));
    Ok(())
}

#[test]
fn full_store_yields_failure_envelope_with_ok_status() -> TestResult<()> {
    let server = TestServer::start_with_args(&["--max-rows", "1"])?;
    let client = server.client()?;

    client.execute("INSERT INTO users VALUES (1, 'A', 'a@x')")?;
    let failed = client.execute("INSERT INTO users VALUES (2, 'B', 'b@x')")?;
    assert!(!failed.success);
    assert_eq!(failed.rows_affected, 0);
    assert!(failed.message.starts_with("Error: "));
    Ok(())
}

#[test]
fn echo_backend_reflects_statements() -> TestResult<()> {
    let server = TestServer::start_with_args(&["--backend", "echo"])?;
    let client = server.client()?;

    let executed = client.execute("CREATE TABLE t")?;
    assert_eq!(executed.message, "Executed query: CREATE TABLE t");
    let queried = client.query("SELECT 1")?;
    assert!(queried.data.is_empty());
    assert_eq!(queried.message, "Queried: SELECT 1");
    Ok(())
}

#[test]
fn unknown_command_maps_to_not_found() -> TestResult<()> {
    let server = TestServer::start()?;
    let client = server.client()?;

    let err = match client.invoke::<Value, Value>("vacuum", &json!({})) {
        Ok(value) => return Err(format!("expected error, got {value}").into()),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.message().unwrap_or_default().contains("vacuum"));
    Ok(())
}

#[test]
fn malformed_bodies_are_bad_requests() -> TestResult<()> {
    let server = TestServer::start()?;

    let (status, body) = server.post_raw("/v0/invoke/query", "{not json");
    assert_eq!(status, 400);
    assert_eq!(body["error"]["kind"], json!("Usage"));

    let (status, body) = server.post_raw("/v0/invoke/execute", r#"{"query": 42}"#);
    assert_eq!(status, 400);
    assert_eq!(body["error"]["kind"], json!("Usage"));

    let (status, body) = server.post_raw("/v0/invoke/query", "");
    assert_eq!(status, 200);
    assert_eq!(body["message"], json!("No data returned"));
    Ok(())
}

fn pick_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn wait_for_server(child: &mut Child, addr: SocketAddr) -> TestResult<()> {
    let url = format!("http://{addr}/healthz");
    let start = Instant::now();
    loop {
        if let Ok(resp) = ureq::get(&url).call() {
            if resp.status() == 200 {
                return Ok(());
            }
        }
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let detail = stderr.trim();
            return Err(format!(
                "server exited before ready (status: {status}, stderr: {})",
                if detail.is_empty() { "<empty>" } else { detail }
            )
            .into());
        }
        if start.elapsed() > Duration::from_secs(8) {
            return Err("server did not start in time".into());
        }
        sleep(Duration::from_millis(20));
    }
}
