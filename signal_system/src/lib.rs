//! Signal system for model event handling
//!
//! This crate provides the hook mechanism models and entries report through:
//! field writes on entries, row writes on models, and failed queries.

pub mod event;
pub mod manager;
pub mod prelude;

pub use event::{EventType, ModelEvent};
pub use manager::{EventCallback, SignalManager};
