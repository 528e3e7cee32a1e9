// Adapters layer: concrete implementations for external systems (http, local storage, csv export).

pub mod admin;
pub mod export;
pub mod http;
pub mod storage;
