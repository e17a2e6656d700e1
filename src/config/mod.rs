//! Configuration module for Wiki-Trawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a crawl can also run with no file at all and
//! command-line overrides only.
//!
//! # Example
//!
//! ```no_run
//! use wiki_trawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawl.toml")).unwrap();
//! println!("Crawling from: {}", config.crawler.start_url);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
