// src/bridge.rs
//! Subscribe/unsubscribe state machine and raw-entry translation.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::models::{Delivery, MessageEvent};
use crate::sink::EventSink;
use crate::source::{NotificationHandler, NotificationSource, RegistrationError};

/// Observable bridge lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No OS registration held, no subscriber attached.
    Idle,
    /// Exactly one OS registration held, exactly one subscriber attached.
    Active,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// `start` was called while a subscriber is already attached. The
    /// existing registration and subscriber are left untouched.
    #[error("bridge already has an active subscriber")]
    AlreadyActive,
    /// The OS refused to install the listener; the bridge stays idle and
    /// `start` may be retried.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

type SubscriberSlot = Arc<Mutex<Option<Arc<dyn EventSink>>>>;

/// Owns at most one live OS registration and pushes each received message to
/// at most one subscriber.
///
/// Host calls are serialized by `&mut self`; the OS delivery context shares
/// only the subscriber slot with the host. The slot is filled before the
/// listener is installed and cleared before it is removed, so a broadcast
/// racing a `stop` finds an empty slot and is dropped rather than queued.
pub struct EventBridge<S: NotificationSource> {
    source: S,
    subscriber: SubscriberSlot,
    registration: Option<S::Handle>,
}

impl<S: NotificationSource> EventBridge<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            subscriber: Arc::new(Mutex::new(None)),
            registration: None,
        }
    }

    pub fn state(&self) -> BridgeState {
        if self.registration.is_some() {
            BridgeState::Active
        } else {
            BridgeState::Idle
        }
    }

    /// Attaches `subscriber` and installs the OS listener.
    pub async fn start(&mut self, subscriber: Arc<dyn EventSink>) -> Result<(), BridgeError> {
        if self.registration.is_some() {
            return Err(BridgeError::AlreadyActive);
        }

        set_slot(&self.subscriber, Some(subscriber));

        let handler = delivery_handler(Arc::clone(&self.subscriber));
        match self.source.register(handler).await {
            Ok(handle) => {
                self.registration = Some(handle);
                tracing::debug!("bridge active");
                Ok(())
            }
            Err(err) => {
                set_slot(&self.subscriber, None);
                Err(BridgeError::Registration(err))
            }
        }
    }

    /// Releases the OS listener and detaches the subscriber.
    ///
    /// Safe from any teardown path and callable any number of times; only
    /// the first call after a successful `start` unregisters anything.
    pub fn stop(&mut self) {
        if let Some(handle) = self.registration.take() {
            set_slot(&self.subscriber, None);
            self.source.unregister(handle);
            tracing::debug!("bridge idle");
        }
    }
}

impl<S: NotificationSource> Drop for EventBridge<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn set_slot(slot: &SubscriberSlot, value: Option<Arc<dyn EventSink>>) {
    *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
}

/// Builds the handler invoked on the OS delivery context.
///
/// The slot lock is held only long enough to clone the sink; translation and
/// push happen outside it. Per-event sink failures are logged and never stop
/// delivery of the remaining entries.
fn delivery_handler(slot: SubscriberSlot) -> NotificationHandler {
    Arc::new(move |delivery: Delivery| {
        let sink = slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let Some(sink) = sink else {
            // No subscriber attached; the delivery is dropped, not queued.
            return;
        };

        for entry in delivery.entries {
            let event = MessageEvent::from_raw(entry);
            if let Err(err) = sink.push(event) {
                tracing::warn!(%err, "subscriber rejected event");
            }
        }
    })
}
