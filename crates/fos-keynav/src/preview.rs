//! Preview host
//!
//! Owns a page and the tracker attached to it and plays the event loop: every
//! input is dispatched to the listeners the document matched, then mutation
//! records are drained and delivered until the observer has nothing left.

use fos_dom::{Document, DomEvent, DomResult, NodeId};
use serde_json::Value;

use crate::channel::{ChannelError, Emitter, InboundMessage};
use crate::clock::{Clock, SystemClock};
use crate::tracker::NavigationTracker;

/// Rounds of mutation delivery before the host gives up on a page that keeps
/// mutating in response to its own rescans
const MAX_FLUSH_ROUNDS: usize = 16;

#[derive(Debug)]
pub struct Preview<E: Emitter, C: Clock = SystemClock> {
    document: Document,
    tracker: NavigationTracker<E, C>,
}

impl<E: Emitter, C: Clock> Preview<E, C> {
    pub fn new(document: Document, tracker: NavigationTracker<E, C>) -> Self {
        Self { document, tracker }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tracker(&self) -> &NavigationTracker<E, C> {
        &self.tracker
    }

    /// Deliver a channel message to the tracker. Rejected messages are logged
    /// and returned; the page is left untouched.
    pub fn receive(&mut self, name: &str, payload: &Value) -> Result<(), ChannelError> {
        let message = InboundMessage::decode(name, payload).inspect_err(|err| {
            tracing::warn!("Rejected message: {}", err);
        })?;
        tracing::debug!("Received {:?}", message);
        self.tracker.apply_message(&mut self.document, message);
        self.flush_mutations();
        Ok(())
    }

    /// Page script or the user edits the document
    pub fn mutate<R>(&mut self, edit: impl FnOnce(&mut Document) -> R) -> R {
        let result = edit(&mut self.document);
        self.flush_mutations();
        result
    }

    /// Key press at the focused element
    pub fn press_key(&mut self, key: &str, code: &str) {
        let event = self.document.key_down(key, code);
        self.dispatch(&event);
    }

    /// Move focus, firing blur on the previous element first
    pub fn focus(&mut self, id: NodeId) -> DomResult<()> {
        for event in self.document.focus(id)? {
            self.dispatch(&event);
        }
        Ok(())
    }

    pub fn blur(&mut self) {
        if let Some(event) = self.document.blur() {
            self.dispatch(&event);
        }
    }

    /// Fire an event at the document's matching listeners
    pub fn dispatch(&mut self, event: &DomEvent) {
        for listener in self.document.listeners_for(event) {
            self.tracker.handle_event(&mut self.document, listener, event);
        }
        self.flush_mutations();
    }

    /// Deliver pending mutation records until the observer is quiet
    pub fn flush_mutations(&mut self) {
        for _ in 0..MAX_FLUSH_ROUNDS {
            let Some(observer) = self.tracker.observer() else {
                return;
            };
            let records = self.document.tree.take_records(observer);
            if records.is_empty() {
                return;
            }
            self.tracker.handle_mutations(&mut self.document, &records);
        }
        tracing::warn!("Mutations still pending after {} rounds", MAX_FLUSH_ROUNDS);
    }
}
