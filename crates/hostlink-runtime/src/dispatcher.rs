//! Event dispatcher for host-initiated messages.
//!
//! Each event name has a single handler slot. Registering a second
//! handler for a name replaces the first. Events that arrive while the
//! slot is empty are dropped, not buffered: registering later only
//! affects future events.
//!
//! # Concurrency
//!
//! The slot map sits behind a `parking_lot::Mutex`. `dispatch` clones
//! the handler out and releases the lock before calling it, so a handler
//! may register or remove handlers (including its own) without
//! deadlocking.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Handler for one event name. Receives the event's `args`.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Event names the host emits without being asked.
pub mod events {
    pub const THEME_CHANGE: &str = "themeChange";
    pub const CONTEXT_CHANGE: &str = "contextChange";
    pub const LOAD: &str = "load";
    pub const BEFORE_UNLOAD: &str = "beforeUnload";
    pub const FOCUS_ENTER: &str = "focusEnter";
    pub const BACK_BUTTON_PRESS: &str = "backButtonPress";
    pub const FULL_SCREEN_CHANGE: &str = "fullScreenChange";
}

/// Function name used to tell the host a handler now exists.
pub const REGISTER_HANDLER_FUNC: &str = "registerHandler";

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran.
    Handled,
    /// No handler was registered; the event was dropped.
    Dropped,
}

/// Map from event name to at most one handler.
#[derive(Default)]
pub struct EventDispatcher {
    slots: Mutex<HashMap<String, EventHandler>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("registered", &self.registered_names())
            .finish()
    }
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `handler` in the slot for `name`.
    ///
    /// Returns `true` if a previous handler was replaced.
    pub fn register(&self, name: impl Into<String>, handler: EventHandler) -> bool {
        let name = name.into();
        let replaced = self.slots.lock().insert(name.clone(), handler).is_some();
        debug!(event = %name, replaced, "Registered event handler");
        replaced
    }

    /// Empties the slot for `name`. Returns `true` if it held a handler.
    pub fn remove(&self, name: &str) -> bool {
        self.slots.lock().remove(name).is_some()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.slots.lock().contains_key(name)
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Names with a registered handler, sorted.
    #[must_use]
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.slots.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs the handler for `name`, if any.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> DispatchOutcome {
        let handler = self.slots.lock().get(name).cloned();
        match handler {
            Some(handler) => {
                trace!(event = name, "Dispatching event");
                handler(args);
                DispatchOutcome::Handled
            }
            None => {
                debug!(event = name, "No handler registered, dropping event");
                DispatchOutcome::Dropped
            }
        }
    }
}
