pub mod charts;
pub mod debounce;
pub mod detail;
pub mod engine;
pub mod grouper;
pub mod paginator;
pub mod render;
pub mod sequence;
pub mod sorter;

pub use crate::domain::model::{ContractGroup, RepeatedServiceRecord};
pub use crate::domain::ports::{ConfigProvider, DashboardApi, Storage};
pub use crate::utils::error::Result;
