//! Shared primitives: errors, connections, schemas, configuration, audit
//! trail and transcript output.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod schemas;
pub mod time;
