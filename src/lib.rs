//! StreamCredit — Benford's Law fraud screening and rule-based credit decisions
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod fraud;
pub mod credit;
pub mod generator;
pub mod api;
