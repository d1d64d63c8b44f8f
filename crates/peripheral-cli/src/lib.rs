//! Peripheral CLI library
//!
//! Exposes the CLI modules for the `blepd` binary and its tests.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod interactive;
