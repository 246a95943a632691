pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Result, ServerError};

// Re-export workspace crates
pub use api;
pub use simulator;
