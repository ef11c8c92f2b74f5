//! CLI module for the MagIC contribution tools
//!
//! Every command works on local files only: contribution text or JSON in,
//! tables and diagnostics out.

pub mod error;
pub mod output;

pub mod catalog;
pub mod config;
pub mod parse;
pub mod upgrade;
