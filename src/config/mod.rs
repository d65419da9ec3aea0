//! Configuration module for Paperbind
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to documented defaults.
//!
//! # Example
//!
//! ```no_run
//! use paperbind::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("paperbind.toml")).unwrap();
//! println!("Workers: {}", config.pipeline.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EmailConfig, FetchConfig, InputConfig, OutputConfig, PipelineConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
