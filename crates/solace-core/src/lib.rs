pub mod error;
pub mod types;
pub mod config;
pub mod pipeline;
pub mod provider;
pub mod service;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
