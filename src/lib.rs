pub mod actors;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod office;
pub mod report;
pub mod transcript;
pub mod utils;

pub use actors::{OfficeCoordinator, RunSummary};
pub use config::{ConfigError, OfficeConfig};
pub use error::{OfficeError, Result};
