// Core modules implementing statement handling, session state, and error modeling.
pub mod backend;
pub mod classify;
pub mod error;
pub mod extract;
pub mod mock;
pub mod row;
pub mod session;
