//! Spreadsheet export utilities for an admin site
//!
//! Records are exported to CSV, ODS or XLSX through textual column mappings,
//! uploaded spreadsheets are completed from stored records, and stored
//! selections, site actions and mass mail are driven from one TOML config.

pub mod actions;
pub mod admin;
pub mod config;
pub mod export;
pub mod mail;
pub mod selection;

pub use config::Config;
