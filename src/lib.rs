// ABOUTME: Library root for cfnbot - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod deploy;
pub mod error;
pub mod events;
pub mod gateway;
pub mod output;
pub mod spec;
pub mod types;
