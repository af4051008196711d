//! mongoproxy-schema - schema enforcement for a document database proxy
//!
//! Validates inserts and update operator documents against per-collection
//! schemas before they reach the backing store.

pub mod cli;
pub mod schema;
