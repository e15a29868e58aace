//! Purpose: Turn typed command requests into result envelopes over a `Backend`.
//! Exports: `Dispatcher`.
//! Role: The single boundary where backend failures become `success = false` envelopes.
//! Invariants: `ping`, `execute`, and `query` never return `Err` and never panic on input.
//! Invariants: A missing `query` or `value` is treated as the empty string.
//! Invariants: One dispatcher owns one backend; callers serialize access (`&mut self`).
use tracing::{debug, warn};

use super::models::{
    ExecuteRequest, ExecuteResponse, PingRequest, PingResponse, QueryRequest, QueryResponse,
};
use crate::core::backend::Backend;

pub struct Dispatcher<B> {
    backend: B,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn ping(&self, request: PingRequest) -> PingResponse {
        PingResponse {
            value: Some(request.value.unwrap_or_default()),
        }
    }

    pub fn execute(&mut self, request: ExecuteRequest) -> ExecuteResponse {
        let query = request.query.unwrap_or_default();
        debug!(backend = self.backend.name(), query = %query, "execute");
        match self.backend.execute(&query) {
            Ok(executed) => executed.into(),
            Err(err) => {
                warn!(backend = self.backend.name(), error = %err, "execute failed");
                ExecuteResponse::failure(&err)
            }
        }
    }

    pub fn query(&mut self, request: QueryRequest) -> QueryResponse {
        let query = request.query.unwrap_or_default();
        debug!(backend = self.backend.name(), query = %query, "query");
        match self.backend.query(&query) {
            Ok(queried) => queried.into(),
            Err(err) => {
                warn!(backend = self.backend.name(), error = %err, "query failed");
                QueryResponse::failure(&err)
            }
        }
    }
}
