//! Credit score report engine.
//!
//! Builds a per-user report from fetched account data: monthly balance
//! and category breakdowns, rolling 12-month indicators, and a selective
//! RSA-PSS signature over the report's identifying fields. The store
//! persists the report tree and the public key archive in SQLite.

pub mod aggregate;
pub mod assembler;
pub mod balance;
pub mod category;
pub mod error;
pub mod keys;
pub mod money;
pub mod monthly;
pub mod report;
pub mod signed_fields;
pub mod signer;
pub mod store;
pub mod transaction;
pub mod types;
pub mod window;
