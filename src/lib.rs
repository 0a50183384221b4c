#![doc(test(attr(deny(warnings))))]

//! Budget Rule applies a needs/wants/savings allocation rule to a stream of
//! income and expense transactions and reports how each bucket is tracking.
//!
//! The computation lives in [`rule_core`]; this crate wires it to the JSON
//! stores and the command-line front end.

pub mod cli;
pub mod errors;
pub mod session;
pub mod utils;

pub use rule_config;
pub use rule_core;
pub use rule_domain;
pub use rule_storage_json;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Budget Rule tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }
}
