//! Library crate for cam-scan-rs: the directory scraper core and the chat proxy.
pub mod config;
pub mod countries;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod paginator;
pub mod proxy;
pub mod scraper;
pub mod telemetry;
pub mod types;
