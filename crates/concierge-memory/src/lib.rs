//! # concierge-memory
//!
//! Persistent per-user state for Concierge (SQLite-backed): session rows,
//! conversation history and reminders.

pub mod store;

pub use store::{Reminder, ReminderOutcome, ReminderStatus, Store};
