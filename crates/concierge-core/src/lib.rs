//! # concierge-core
//!
//! Core types, traits, configuration, and error handling for the Concierge
//! assistant.

pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod session;
pub mod traits;

pub use config::shellexpand;
