//! rule-core
//!
//! Budget aggregation and allocation-status engine.
//! Depends on rule-domain. No CLI, no terminal I/O, no direct storage interactions:
//! collaborators are reached through the traits in [`store`].

pub mod aggregate_service;
pub mod allocation_service;
pub mod balance_service;
pub mod dashboard_service;
pub mod error;
pub mod normalize_service;
pub mod rule_service;
pub mod series_service;
pub mod store;
pub mod time;
pub mod transaction_service;
pub mod window_service;

pub use aggregate_service::*;
pub use allocation_service::*;
pub use balance_service::*;
pub use dashboard_service::*;
pub use error::CoreError;
pub use normalize_service::*;
pub use rule_service::*;
pub use series_service::*;
pub use store::{RuleStore, TransactionPayload, TransactionStore};
pub use time::{Clock, FixedClock, SystemClock};
pub use transaction_service::*;
pub use window_service::*;

#[cfg(test)]
mod tests;
