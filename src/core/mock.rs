//! Purpose: In-memory mock statement engine backing `execute` and `query`.
//! Exports: `MockBackend`, `sample_rows`, and the fixed status messages.
//! Role: Default backend; combines the classifier, extractor and session store.
//! Invariants: CREATE TABLE clears the store; INSERT appends at most one row.
//! Invariants: INSERT reports one affected row even when nothing was extracted.
//! Invariants: A VALUES list without parentheses is split as-is and still appends a row.
//! Invariants: An empty store answers SELECT with the two sample rows and stays empty.
use tracing::debug;

use super::backend::{Backend, Executed, Queried};
use super::classify::{Intent, classify, mentions_select};
use super::error::Error;
use super::extract::extract_row;
use super::row::Row;
use super::session::SessionStore;

pub const TABLE_CREATED: &str = "Table created successfully (mock)";
pub const DATA_INSERTED: &str = "Data inserted successfully (mock)";
pub const COMMAND_EXECUTED: &str = "Command executed successfully (mock)";
pub const QUERY_EXECUTED: &str = "Query executed successfully (mock)";
pub const NO_DATA: &str = "No data returned";

pub fn sample_rows() -> Vec<Row> {
    vec![
        Row::user(1, "Sample User 1", "user1@example.com"),
        Row::user(2, "Sample User 2", "user2@example.com"),
    ]
}

#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    store: SessionStore,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: SessionStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn execute(&mut self, query: &str) -> Result<Executed, Error> {
        let intent = classify(query);
        debug!(?intent, rows = self.store.len(), "mock execute");
        match intent {
            Intent::Create => {
                self.store.clear();
                Ok(Executed::new(TABLE_CREATED, 0))
            }
            Intent::Insert => {
                match extract_row(query, self.store.len()) {
                    Some(row) => self.store.push(row)?,
                    None => debug!("insert has no usable VALUES clause; store unchanged"),
                }
                Ok(Executed::new(DATA_INSERTED, 1))
            }
            Intent::Select | Intent::Other => Ok(Executed::new(COMMAND_EXECUTED, 0)),
        }
    }

    fn query(&mut self, query: &str) -> Result<Queried, Error> {
        if !mentions_select(query) {
            return Ok(Queried::new(Vec::new(), NO_DATA));
        }
        let rows = if self.store.is_empty() {
            sample_rows()
        } else {
            self.store.rows().to_vec()
        };
        debug!(rows = rows.len(), "mock query");
        Ok(Queried::new(rows, QUERY_EXECUTED))
    }
}
