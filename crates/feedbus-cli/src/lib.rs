//! # Feedbus CLI
//!
//! Command line front end for the feed bus client.

#![warn(missing_docs)]

/// Command line arguments
pub mod cli;

/// Subcommand runners
pub mod commands;

/// Interactive subscription requests read from stdin
pub mod interactive;
