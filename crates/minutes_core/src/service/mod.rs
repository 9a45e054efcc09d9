//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate config, roster and reconciliation calls per user action.
//! - Keep UI layers decoupled from sheet layout and retry details.

pub mod minutes_service;
