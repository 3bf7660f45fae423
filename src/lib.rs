//! Pipetrack (Sales Pipeline Tracker) - A command-line sales pipeline and lead tracking tool
//!
//! This library provides the core functionality for Pipetrack, including:
//! - Database operations and migrations
//! - Data models for leads, pipeline stages, and activities
//! - Repository layer for data access, including the kanban board
//!   ordering engine and per-stage dwell-time accounting
//! - CLI command parsing and execution
//! - Date/time and duration utilities
//!
//! # Example
//!
//! ```no_run
//! use pipetrack::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod db;
pub mod models;
pub mod repo;
pub mod cli;
pub mod utils;
