//! Task module
//!
//! This module contains the task model, its wire form and storage.

mod file_store;
mod model;
mod repository;
mod wire;

pub use file_store::FileTaskStore;
pub use model::*;
pub use repository::TaskRepository;
pub use wire::WireTask;
