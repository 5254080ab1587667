//! Core library for the todo board
//!
//! This crate contains the core business logic, including:
//! - Task model, wire format and the file-backed document store
//! - Transports the client-side state talks through
//! - The todo state module: optimistic mutations, stats, calendar lookups
//!   and overdue notifications

pub mod calendar;
pub mod error;
pub mod filter;
pub mod notify;
pub mod state;
pub mod stats;
pub mod task;
pub mod transport;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
