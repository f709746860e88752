//! Shared data model for `descry`: hardware addresses and vendor prefixes, neighbor-table
//! records, the interface model and runtime configuration.

pub mod config;
pub mod network;
