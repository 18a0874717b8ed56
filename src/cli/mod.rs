#![forbid(unsafe_code)]

//! Command-line support: CSV import of contacts and roots, CSV export of reports.

/// Contact and root import, report export.
///
/// External identifiers are arbitrary strings; they are mapped to one-based
/// ids in first-seen order so the engine never sees the raw names.
pub mod import_export;
