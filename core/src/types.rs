//! Shared identifier types used across the report engine.

use uuid::Uuid;

/// The user a credit score report belongs to.
pub type UserId = Uuid;

/// A stored credit score report.
pub type ReportId = Uuid;

/// Identifies the asymmetric key pair a signature was made with.
/// Persisted next to each signature so key rotation never breaks
/// verification of old reports.
pub type KeyId = Uuid;
