//! Shared primitive types used across the entire engine.

/// A stable player identifier, as supplied by the CRM export.
pub type PlayerId = String;

/// Row id of an aggregate snapshot in the history database.
pub type SnapshotId = i64;
