//! # Configuration Module
//!
//! Runtime configuration and the explicit application context handed to
//! sessions and the command line.

pub mod config;

pub use config::{AppConfig, AppContext};
