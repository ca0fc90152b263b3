use crate::event::DatabaseEvent;
use crate::types::EventCallback;
use config::SignalConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Identifier returned by [`SignalManager::add_callback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Counters describing signal traffic since the manager was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalStats {
    pub callbacks: usize,
    pub events_emitted: u64,
    pub callback_failures: u64,
}

/// Signal manager for database event notifications
pub struct SignalManager {
    config: SignalConfig,
    callbacks: RwLock<Vec<(CallbackId, EventCallback)>>,
    next_id: AtomicU64,
    events_emitted: AtomicU64,
    callback_failures: AtomicU64,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("enabled", &self.config.enabled)
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events_emitted: AtomicU64::new(0),
            callback_failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Add event callback
    ///
    /// Returns `None` when the configured `max_callbacks` is already reached.
    pub fn add_callback<F>(&self, callback: F) -> Option<CallbackId>
    where
        F: Fn(&DatabaseEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write().ok()?;
        if callbacks.len() >= self.config.max_callbacks {
            tracing::warn!(
                max_callbacks = self.config.max_callbacks,
                "signal callback limit reached, callback not registered"
            );
            return None;
        }

        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        callbacks.push((id, Arc::new(callback)));
        Some(id)
    }

    /// Remove a previously registered callback; returns whether it existed
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        match self.callbacks.write() {
            Ok(mut callbacks) => {
                let before = callbacks.len();
                callbacks.retain(|(existing, _)| *existing != id);
                callbacks.len() != before
            }
            Err(_) => false,
        }
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: DatabaseEvent) {
        if !self.config.enabled {
            return;
        }

        // Snapshot so callbacks may register or remove callbacks themselves
        let callbacks: Vec<EventCallback> = match self.callbacks.read() {
            Ok(callbacks) => callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(_) => return,
        };

        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        for callback in callbacks {
            if let Err(error) = callback(&event) {
                self.callback_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    table = %event.table_name,
                    event_type = ?event.event_type,
                    %error,
                    "signal callback failed"
                );
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

    pub fn stats(&self) -> SignalStats {
        SignalStats {
            callbacks: self.callback_count(),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}
