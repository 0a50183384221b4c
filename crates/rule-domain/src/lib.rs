//! rule-domain
//!
//! Pure domain models for income/expense tracking under a 50/30/20-style
//! allocation rule. No I/O, no CLI, no storage. Only data types and core enums.

pub mod period;
pub mod raw;
pub mod rule;
pub mod transaction;

pub use period::*;
pub use raw::*;
pub use rule::*;
pub use transaction::*;

// Re-export common dependencies so consumers can rely on this crate as a façade.
pub use chrono;
pub use rust_decimal;
pub use serde;
