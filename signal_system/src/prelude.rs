//! Convenience re-exports for common signal-system usage

pub use crate::event::{EventType, ModelEvent};
pub use crate::manager::{EventCallback, SignalManager};
