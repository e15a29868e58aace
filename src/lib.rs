//! Purpose: Shared library crate used by the `sqlbridge` CLI, transports, and native shells.
//! Exports: `api` (typed commands, backends, client), `bridge` (command router), `abi`.
//! Role: Hosts the mock statement engine behind a `(command, payload) -> envelope` contract.
//! Invariants: Session state is owned per engine instance; there are no globals.
//! Invariants: Statement failures surface as envelopes, never as panics.
pub mod abi;
pub mod api;
pub mod bridge;
mod core;
