//! Domain types and pure business logic.
//!
//! Everything in here is synchronous and free of I/O: the service catalog
//! with its price bands, the text complexity scorer, and the quote
//! calculator.

pub mod catalog;
pub mod complexity;
pub mod quote;
