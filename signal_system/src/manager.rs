use crate::event::{EventType, ModelEvent};

/// Callback invoked synchronously for every emitted event
pub type EventCallback = Box<dyn Fn(&ModelEvent) + Send + Sync>;

/// Signal manager for model event notifications
pub struct SignalManager {
    callbacks: std::sync::RwLock<Vec<(Option<EventType>, EventCallback)>>,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self {
            callbacks: std::sync::RwLock::new(Vec::new()),
        }
    }

    /// Add callback receiving every event
    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push((None, Box::new(callback)));
        }
    }

    /// Add callback receiving only one event type
    pub fn on<F>(&self, event_type: EventType, callback: F)
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push((Some(event_type), Box::new(callback)));
        }
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: ModelEvent) {
        if let Ok(callbacks) = self.callbacks.read() {
            for (filter, callback) in callbacks.iter() {
                let filter: Option<EventType> = *filter;
                if filter.map_or(true, |t| t == event.event_type) {
                    callback(&event);
                }
            }
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}
