//! Data models for invoices and configuration.

pub mod config;
pub mod invoice;

pub use config::FacturaConfig;
pub use invoice::*;
