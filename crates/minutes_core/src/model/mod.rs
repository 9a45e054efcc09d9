//! Minutes domain model.
//!
//! # Responsibility
//! - Define the record collected by the minutes form.
//! - Provide pure composition helpers (absences, formats, defaults).
//!
//! # Invariants
//! - Nothing in this module touches the store.

pub mod attendance;
pub mod format;
pub mod meeting;
pub mod minutes;
