// src/source.rs
//! Registration-scoped wrapper contract for the OS broadcast facility.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Delivery;

/// Callback invoked on the delivery context the OS controls, once per
/// broadcast, with the ordered raw entries bundled in that delivery.
pub type NotificationHandler = Arc<dyn Fn(Delivery) + Send + Sync>;

/// Errors installing an OS-level listener.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// This source instance already holds a live registration.
    #[error("a listener is already registered on this source")]
    AlreadyRegistered,
    /// The OS refused the registration (e.g. missing permission).
    #[error("listener registration denied: {0}")]
    Denied(String),
    /// The message bus rejected the subscription.
    #[error(transparent)]
    Bus(#[from] zbus::Error),
}

/// A source of new-message notifications.
///
/// At most one registration per instance. `unregister` consumes the handle,
/// so a released registration cannot be released twice; the idempotent
/// surface for callers is [`EventBridge::stop`](crate::EventBridge::stop).
#[async_trait]
pub trait NotificationSource: Send {
    /// Opaque proof of a live registration.
    type Handle: Send;

    /// Installs a listener for the new-message notification kind. Matching
    /// OS events invoke `on_notification` on the OS delivery context until
    /// the returned handle is passed to [`unregister`](Self::unregister).
    async fn register(
        &mut self,
        on_notification: NotificationHandler,
    ) -> Result<Self::Handle, RegistrationError>;

    /// Removes the listener; the OS stops delivering events to this handle.
    fn unregister(&mut self, handle: Self::Handle);
}
