// src/dbus.rs
//! D-Bus notification source for incoming SMS broadcasts.
//!
//! Subscribes to KDE Connect `conversationUpdated` signals on the session
//! bus and forwards each delivery to the registered handler.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use zbus::{Connection, MatchRule, MessageStream};

use crate::models::{Delivery, RawEntry};
use crate::source::{NotificationHandler, NotificationSource, RegistrationError};

const KDECONNECT_SERVICE: &str = "org.kde.kdeconnect";
const CONVERSATIONS_INTERFACE: &str = "org.kde.kdeconnect.device.conversations";
const MESSAGE_RECEIVED_MEMBER: &str = "conversationUpdated";

/// New-message source scoped to one paired device.
pub struct DbusSmsSource {
    device_id: String,
    registered: bool,
}

/// Live D-Bus registration: the background task draining the signal stream.
pub struct DbusRegistration {
    task: JoinHandle<()>,
}

impl DbusSmsSource {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            registered: false,
        }
    }
}

#[async_trait]
impl NotificationSource for DbusSmsSource {
    type Handle = DbusRegistration;

    async fn register(
        &mut self,
        on_notification: NotificationHandler,
    ) -> Result<DbusRegistration, RegistrationError> {
        if self.registered {
            return Err(RegistrationError::AlreadyRegistered);
        }

        let conn = Connection::session().await?;

        let rule = MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .sender(KDECONNECT_SERVICE)?
            .interface(CONVERSATIONS_INTERFACE)?
            .member(MESSAGE_RECEIVED_MEMBER)?
            .build();

        let mut stream = MessageStream::for_match_rule(rule, &conn, None).await?;

        let device_id = self.device_id.clone();
        let task = tokio::spawn(async move {
            tracing::debug!(device = %device_id, "signal listener started");

            while let Some(msg) = stream.next().await {
                let Ok(msg) = msg else {
                    continue;
                };

                let header = msg.header();
                let path = header.path().map(|p| p.as_str()).unwrap_or("");
                if !path.contains(&device_id) {
                    continue;
                }

                let delivery = parse_delivery(&msg);
                if !delivery.entries.is_empty() {
                    on_notification(delivery);
                }
            }

            tracing::debug!(device = %device_id, "signal listener ended");
        });

        self.registered = true;
        Ok(DbusRegistration { task })
    }

    fn unregister(&mut self, handle: DbusRegistration) {
        handle.task.abort();
        self.registered = false;
    }
}

/// Extracts the ordered raw entries bundled in one signal delivery.
///
/// KDE Connect emits one message structure per signal, but a body that is an
/// array of structures yields one entry each, in bus order.
fn parse_delivery(msg: &zbus::Message) -> Delivery {
    let body = msg.body();
    let Ok(value) = body.deserialize::<zbus::zvariant::Value>() else {
        return Delivery::default();
    };

    let entries = match &value {
        zbus::zvariant::Value::Array(items) => items.iter().filter_map(parse_entry).collect(),
        other => parse_entry(other).into_iter().collect(),
    };

    Delivery { entries }
}

fn parse_entry(value: &zbus::zvariant::Value) -> Option<RawEntry> {
    let zbus::zvariant::Value::Structure(fields) = value else {
        return None;
    };

    let fields: Vec<zbus::zvariant::Value> = fields.fields().to_vec();

    // Message type: 1 = received, 2 = sent. Only inbound messages become events.
    if extract_i32(&fields, 4).unwrap_or(1) != 1 {
        return None;
    }

    Some(RawEntry {
        address: extract_phone_from_array(&fields, 2),
        body: extract_string(&fields, 1),
        timestamp: extract_i64(&fields, 3).unwrap_or_else(now_millis),
    })
}

// Helper functions for extracting values from D-Bus variants

fn extract_string(fields: &[zbus::zvariant::Value], index: usize) -> Option<String> {
    match fields.get(index) {
        Some(zbus::zvariant::Value::Str(s)) => Some(s.to_string()),
        _ => None,
    }
}

fn extract_i32(fields: &[zbus::zvariant::Value], index: usize) -> Option<i32> {
    match fields.get(index) {
        Some(zbus::zvariant::Value::I32(n)) => Some(*n),
        _ => None,
    }
}

fn extract_i64(fields: &[zbus::zvariant::Value], index: usize) -> Option<i64> {
    match fields.get(index) {
        Some(zbus::zvariant::Value::I64(n)) => Some(*n),
        _ => None,
    }
}

fn extract_phone_from_array(fields: &[zbus::zvariant::Value], index: usize) -> Option<String> {
    let zbus::zvariant::Value::Array(arr) = fields.get(index)? else {
        return None;
    };

    let zbus::zvariant::Value::Structure(phone_struct) = arr.iter().next()? else {
        return None;
    };

    let phone_fields: Vec<_> = phone_struct.fields().to_vec();
    extract_string(&phone_fields, 0)
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
