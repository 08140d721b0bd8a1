//! # pg-testbed
//!
//! A lifecycle manager that lets an automated test suite run against a real,
//! persistent PostgreSQL database (not a mock) while guaranteeing that every
//! test observes a clean, deterministic baseline regardless of execution
//! order or prior failures.
//!
//! ## Architectural Principles
//!
//! - **Real store, reset protocol:** Connecting is the easy part. The value
//!   of this crate is the reset/isolation protocol: bringing a possibly-dirty
//!   database (a crashed run, a prior suite) back to a known-empty baseline
//!   atomically and safely under foreign-key constraints, without dropping
//!   and recreating the schema for every test.
//! - **Explicit handle, no ambient global:** All operations hang off a
//!   [`TestStore`] value that the harness passes around, making lifetime and
//!   isolation reasoning explicit. The one concession to process-wide state
//!   is the once-only load guard inside [`TestStore::load`].
//! - **Structured failures:** Every operation returns a `Result`; nothing is
//!   swallowed and nothing aborts the process. The harness decides whether a
//!   failure kills the current test or the whole run.
//!
//! ## Public API
//!
//! - `Settings` / `load_settings`: the connection configuration surface.
//! - `TestStore::load`: the once-per-process database loader.
//! - `TestStore::clear_tables`: the atomic, constraint-safe clearing engine.
//! - `TestStore::exec` / `exec_sql`: the fail-fast statement helper.
//! - `StoreError`: the specific error types that can be returned.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod reset;
pub mod settings;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{SchemaSpec, TestStore};
pub use error::StoreError;
pub use settings::{Settings, load_settings};
