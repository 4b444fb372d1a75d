//! Core costing logic for Kardex.
//!
//! This crate contains pure business logic with ZERO database dependencies.
//! All domain types, the FIFO engine, and balance calculations live here.
//!
//! # Modules
//!
//! - `kardex` - FIFO lot ledger, balances, adjustment proposals, consistency checks

pub mod kardex;
