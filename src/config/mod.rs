//! Configuration module for Recon-Scan
//!
//! This module handles loading, parsing, and validating scan configuration,
//! either from a TOML file or through [`ScanConfigBuilder`].
//!
//! # Example
//!
//! ```no_run
//! use recon_scan::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scan.toml")).unwrap();
//! println!("Scanner will use {} workers", config.scan.workers);
//! ```

mod builder;
mod parser;
mod types;
mod validation;

pub use builder::ScanConfigBuilder;
pub use types::{
    DedupConfig, FilterConfig, OutputConfig, PatternEntry, ScanConfig, ScanSettings, ScopeMode,
    DEFAULT_DANGER_SUBSTRINGS, DEFAULT_DENY_EXTENSIONS, DEFAULT_USER_AGENT,
};

pub(crate) use validation::validate;
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
