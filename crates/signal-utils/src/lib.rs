//! Shared utilities for stock-signals
//!
//! This crate provides common functionality used across the stock-signals
//! workspace, including logging setup, `.env` loading and config file parsing.

pub mod config;
pub mod logging;

pub use config::{DotenvStatus, load_dotenv, load_toml, parse_toml, resolve_config_path};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
