//! Purpose: Request and response shapes for the `ping`, `execute`, and `query` commands.
//! Exports: `PingRequest`, `PingResponse`, `ExecuteRequest`, `ExecuteResponse`,
//! `QueryRequest`, `QueryResponse`, `ERROR_PREFIX`.
//! Role: Wire contract shared by the dispatcher, transports, and the remote client.
//! Invariants: Field names are camelCase on the wire (`rowsAffected`).
//! Invariants: `success == false` implies an `"Error: "` message and no rows.
use serde::{Deserialize, Serialize};

use crate::core::backend::{Executed, Queried};
use crate::core::error::Error;
use crate::core::row::Row;

pub const ERROR_PREFIX: &str = "Error: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl ExecuteRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub message: String,
    pub rows_affected: i64,
}

impl ExecuteResponse {
    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            message: format!("{ERROR_PREFIX}{}", err.description()),
            rows_affected: 0,
        }
    }
}

impl From<Executed> for ExecuteResponse {
    fn from(executed: Executed) -> Self {
        Self {
            success: true,
            message: executed.message,
            rows_affected: executed.rows_affected,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub data: Vec<Row>,
    pub message: String,
}

impl QueryResponse {
    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            message: format!("{ERROR_PREFIX}{}", err.description()),
        }
    }
}

impl From<Queried> for QueryResponse {
    fn from(queried: Queried) -> Self {
        Self {
            success: true,
            data: queried.rows,
            message: queried.message,
        }
    }
}
