pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{admin::AdminClient, http::HttpDashboardApi, storage::LocalStorage};
pub use config::{CliConfig, DashboardConfig};
pub use core::engine::{DashboardEngine, DashboardView, LoadOutcome};
pub use utils::error::{DashboardError, Result};
