//! Configuration and data model shared by every client.

pub mod config;
pub mod models;
