//! Domain data types.

pub mod config;
pub mod document;
pub mod finding;
