//! Configuration module for Sumi-Map
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file at all) yields the
//! defaults.
//!
//! # Example
//!
//! ```no_run
//! use sumi_map::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sumi-map.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DedupPolicy, FetcherConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
