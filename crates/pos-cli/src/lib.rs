//! Command-line front end for the POS report ingestion pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
pub mod types;
