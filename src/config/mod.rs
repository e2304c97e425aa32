//! Configuration module for LightSNS-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use lightsns_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    AuthorMode, Config, CrawlerConfig, MirrorConfig, OutputConfig, SiteConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
