//! Mile Hub - real-time ranking broadcast server for The Mile Game
//!
//! This library provides the hub that fans ranking updates out to every
//! connected WebSocket client, plus the small HTTP surface around it.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
