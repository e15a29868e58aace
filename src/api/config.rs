//! Purpose: Startup configuration for a bridge engine instance.
//! Exports: `BridgeConfig`, `BackendKind`, `SharedBackend`.
//! Role: Validates user-supplied knobs and builds the selected backend.
//! Invariants: `max_rows` must be positive; validation failures are Usage errors.
use crate::core::backend::{Backend, EchoBackend};
use crate::core::error::{Error, ErrorKind};
use crate::core::mock::MockBackend;
use crate::core::session::{DEFAULT_MAX_ROWS, SessionStore};

pub type SharedBackend = Box<dyn Backend + Send>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BackendKind {
    /// In-memory mock table (mobile behaviour).
    #[default]
    Mock,
    /// Placeholder that echoes statements back (desktop behaviour).
    Echo,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Mock => "mock",
            BackendKind::Echo => "echo",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgeConfig {
    pub backend: BackendKind,
    pub max_rows: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mock,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_rows == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("--max-rows must be greater than zero")
                .with_hint("Use a positive value like 10000."));
        }
        Ok(())
    }

    pub fn build_backend(&self) -> Result<SharedBackend, Error> {
        self.validate()?;
        let backend: SharedBackend = match self.backend {
            BackendKind::Mock => Box::new(MockBackend::with_store(SessionStore::with_max_rows(
                self.max_rows,
            ))),
            BackendKind::Echo => Box::new(EchoBackend),
        };
        Ok(backend)
    }
}
