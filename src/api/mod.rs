//! Dashboard HTTP API
//!
//! JSON surface for the presentation layer.

pub mod handlers;
pub mod server;
pub mod types;

pub use server::ApiServer;
