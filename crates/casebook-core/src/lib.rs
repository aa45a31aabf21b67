//! casebook-core library.
//!
//! Role-based case management: a SQLite case store, a pure access policy,
//! the case lifecycle state machine, best-effort notifications, and the
//! [`CaseService`] façade that composes them.
//!
//! # Conventions
//!
//! - **Errors**: domain operations return [`CaseError`]; bootstrap paths
//!   (opening the store, loading config) use `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod policy;
pub mod service;
pub mod store;

pub use error::{CaseError, ErrorCode};
pub use lifecycle::StatusChange;
pub use service::CaseService;
