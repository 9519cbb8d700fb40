//! Shared types for the MI Coach chat relay.
//!
//! Everything here is plain data plus pure functions: the API server and the
//! CLI both depend on it, so it carries no async runtime and no I/O.

pub mod conversation;
pub mod error;
pub mod health;
pub mod prompts;
pub mod users;
