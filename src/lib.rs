//! # WarEra Community Tax Ledger
//!
//! Tracks the weekly tiered tax owed by members of a WarEra country,
//! reconciles it against donations reported by the platform API, and
//! exposes the current standing through read-only queries:
//! - Database models and queries (players, tax rules, tax settings)
//! - WarEra API adapter with typed per-endpoint parsing
//! - Tax calculator and payment-status classifier
//! - Roster synchronizer and periodic reconciliation pipeline
//! - Single-writer mutation channel for all persisted-state changes

pub mod config;
pub mod context;
pub mod db;
pub mod engine;
pub mod epoch;
pub mod error;
pub mod queries;
pub mod source;
pub mod status;
pub mod sync;
pub mod tax;
pub mod writer;

pub use context::EngineContext;
pub use error::{Error, Result};
