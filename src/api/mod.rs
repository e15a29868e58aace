//! Purpose: Define the stable public Rust API boundary for sqlbridge.
//! Exports: Command models, the dispatcher, backends, configuration, and the remote client.
//! Role: Public, additive-only surface; hides the internal statement modules.
//! Invariants: This module is the only public path to the mock engine and session store.
//! Invariants: Internal modules remain private and are not directly exposed.

mod client;
mod config;
mod dispatcher;
mod models;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::backend::{Backend, EchoBackend, Executed, Queried};
pub use crate::core::classify::{Intent, classify};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::mock::{MockBackend, sample_rows};
pub use crate::core::row::{FieldValue, Row};
pub use crate::core::session::{DEFAULT_MAX_ROWS, SessionStore};
pub use client::RemoteClient;
pub use config::{BackendKind, BridgeConfig, SharedBackend};
pub use dispatcher::Dispatcher;
pub use models::{
    ERROR_PREFIX, ExecuteRequest, ExecuteResponse, PingRequest, PingResponse, QueryRequest,
    QueryResponse,
};
