pub mod cadence;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod rpc;
pub mod session;
pub mod signer;
pub mod status;
pub mod transaction;

pub use error::{Error, Result};
