//! Purpose: Hold the rows of the mock "current table" for one engine instance.
//! Exports: `SessionStore`, `DEFAULT_MAX_ROWS`.
//! Role: Explicitly owned state injected into the mock backend (no globals).
//! Invariants: Rows keep insertion order; `clear` empties the store.
//! Invariants: The store never grows past `max_rows`; overflow is an Execution error.
use super::error::{Error, ErrorKind};
use super::row::Row;

pub const DEFAULT_MAX_ROWS: usize = 10_000;

#[derive(Clone, Debug)]
pub struct SessionStore {
    rows: Vec<Row>,
    max_rows: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_max_rows(DEFAULT_MAX_ROWS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            max_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn push(&mut self, row: Row) -> Result<(), Error> {
        if self.rows.len() >= self.max_rows {
            return Err(Error::new(ErrorKind::Execution)
                .with_message(format!(
                    "session store is full ({} rows)",
                    self.max_rows
                ))
                .with_hint("Run CREATE TABLE to reset the store, or raise --max-rows."));
        }
        self.rows.push(row);
        Ok(())
    }
}
