// src/sink.rs
//! Subscriber-side sink abstraction and ready-made implementations.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::models::MessageEvent;

/// Failure pushing one event into a sink.
///
/// Isolated per event: the bridge logs it and continues with the next event,
/// and its state machine is unaffected.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,
    #[error("sink rejected event: {0}")]
    Rejected(String),
}

/// Single-operation consumer of message events.
///
/// Push is fire-and-forget from the bridge's side: no acknowledgement is
/// awaited and no retry is attempted.
pub trait EventSink: Send + Sync {
    fn push(&self, event: MessageEvent) -> Result<(), SinkError>;
}

impl EventSink for mpsc::UnboundedSender<MessageEvent> {
    fn push(&self, event: MessageEvent) -> Result<(), SinkError> {
        self.send(event).map_err(|_| SinkError::Closed)
    }
}

/// Adapter turning an in-process callback into a sink.
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(MessageEvent) -> Result<(), SinkError> + Send + Sync,
{
    fn push(&self, event: MessageEvent) -> Result<(), SinkError> {
        (self.0)(event)
    }
}

/// Channel-backed sink plus the stream the host consumes events from.
pub fn event_channel() -> (
    mpsc::UnboundedSender<MessageEvent>,
    UnboundedReceiverStream<MessageEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}
