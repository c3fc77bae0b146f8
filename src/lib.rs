// src/lib.rs
//! Republishes OS-level "new message" broadcasts as a structured event
//! stream with a single push subscriber.
//!
//! The host constructs an [`EventBridge`] over a [`NotificationSource`],
//! attaches a sink with [`EventBridge::start`] and detaches it with
//! [`EventBridge::stop`]. Events raised while no subscriber is attached are
//! dropped, not queued.

mod bridge;
mod dbus;
mod models;
mod sink;
mod source;

pub use bridge::{BridgeError, BridgeState, EventBridge};
pub use dbus::{DbusRegistration, DbusSmsSource};
pub use models::{Delivery, MessageEvent, RawEntry, UNKNOWN_SENDER};
pub use sink::{event_channel, EventSink, FnSink, SinkError};
pub use source::{NotificationHandler, NotificationSource, RegistrationError};
