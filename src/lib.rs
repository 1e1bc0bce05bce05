//! focusfeed command-line front end.
//!
//! Loads configuration, drives a focus session over a page fixture and reports what
//! the filtering pipeline did.

pub mod cli;
pub mod config;

pub use config::Config;
