//! Lien deadline rules and invoice payment ledger for construction invoicing.
//!
//! The crate exposes pure domain logic (deadline calculation, priority derivation,
//! payment application) under [`workflows`], a SQLite-backed [`store`] implementing the
//! repository seams, and an [`upstream`] forwarding client for the third-party services
//! the frontend talks to through this backend.

pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod upstream;
pub mod workflows;
