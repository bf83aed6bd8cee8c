pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;
