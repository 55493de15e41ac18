//! Subcommand handlers

pub mod config;
pub mod read;
pub mod routes;
