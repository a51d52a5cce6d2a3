//! Observability for the record store
//!
//! A synchronous structured JSON logger. The store is a library, so it
//! never installs a global subscriber or touches process state; it only
//! emits one-line JSON events for the handful of conditions a host
//! application wants to see (store open, skipped corrupt units, failed
//! artifact cleanup).

mod logger;

pub use logger::{Logger, Severity};
