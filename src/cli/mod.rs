//! Command-line presentation adapter over [`crate::session::DashboardSession`].

pub mod args;
mod handlers;
pub mod output;
pub mod render;

pub use args::Cli;
pub use handlers::run;
