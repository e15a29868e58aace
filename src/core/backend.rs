//! Purpose: Define the statement backend seam behind the command dispatcher.
//! Exports: `Backend`, `Executed`, `Queried`, `EchoBackend`.
//! Role: Lets the mock engine be replaced by a real one without touching callers.
//! Invariants: Backends report failures as `Err`; they never build envelopes.
//! Invariants: `EchoBackend` is stateless and never fails.
use super::error::Error;
use super::row::Row;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Executed {
    pub message: String,
    pub rows_affected: i64,
}

impl Executed {
    pub fn new(message: impl Into<String>, rows_affected: i64) -> Self {
        Self {
            message: message.into(),
            rows_affected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Queried {
    pub rows: Vec<Row>,
    pub message: String,
}

impl Queried {
    pub fn new(rows: Vec<Row>, message: impl Into<String>) -> Self {
        Self {
            rows,
            message: message.into(),
        }
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;
    fn execute(&mut self, query: &str) -> Result<Executed, Error>;
    fn query(&mut self, query: &str) -> Result<Queried, Error>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn execute(&mut self, query: &str) -> Result<Executed, Error> {
        (**self).execute(query)
    }

    fn query(&mut self, query: &str) -> Result<Queried, Error> {
        (**self).query(query)
    }
}

/// Desktop placeholder: acknowledges every statement and returns no rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoBackend;

impl Backend for EchoBackend {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn execute(&mut self, query: &str) -> Result<Executed, Error> {
        Ok(Executed::new(format!("Executed query: {query}"), 0))
    }

    fn query(&mut self, query: &str) -> Result<Queried, Error> {
        Ok(Queried::new(Vec::new(), format!("Queried: {query}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, EchoBackend};

    #[test]
    fn echo_backend_reflects_query_text() {
        let mut backend = EchoBackend;
        let executed = backend.execute("CREATE TABLE t").expect("execute");
        assert_eq!(executed.message, "Executed query: CREATE TABLE t");
        assert_eq!(executed.rows_affected, 0);

        let queried = backend.query("SELECT 1").expect("query");
        assert!(queried.rows.is_empty());
        assert_eq!(queried.message, "Queried: SELECT 1");
    }

    #[test]
    fn boxed_backend_forwards_calls() {
        let mut backend: Box<dyn Backend + Send> = Box::new(EchoBackend);
        assert_eq!(backend.name(), "echo");
        assert_eq!(
            backend.execute("x").expect("execute").message,
            "Executed query: x"
        );
    }
}
