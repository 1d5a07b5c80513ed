//! Delivery Fee Core Library
//!
//! Shared pieces of the fee server and the weather ingestion daemon:
//! - Configuration file discovery and TOML loading
//! - Application-wide defaults

mod config;

pub use config::{find_config_file, load_config, ConfigSource};

/// Application name used for XDG and /etc paths
pub const APP_NAME: &str = "delivery-fee";

/// Default fee server port
pub const DEFAULT_SERVER_PORT: u16 = 9810;

/// Minute of every hour at which new weather observations are ingested
pub const DEFAULT_INGEST_MINUTE: u8 = 15;
