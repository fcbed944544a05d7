//! Producer and consumer helpers for direction-typed string channels.
//!
//! [`send_message`] only ever gets a send-only handle and [`read_message`]
//! only a receive-only one; the handle types make the capability split a
//! compile-time property.

use crate::events::{RendezvousReceiver, RendezvousSender};
use crate::notice::{NoticeSink, StdoutSink};
use tracing::warn;

/// The message deposited by [`send_message`].
pub const GREETING: &str = "hello";

/// Deposit [`GREETING`] on `msgch`, waiting until a consumer takes it.
pub async fn send_message(msgch: &RendezvousSender<String>) {
    if let Err(e) = msgch.send(GREETING.to_string()).await {
        warn!(error = %e, "Failed to deliver message");
    }
}

/// Withdraw one message from `msgch` and print it on standard output.
pub async fn read_message(msgch: &mut RendezvousReceiver<String>) {
    read_message_into(msgch, &StdoutSink).await;
}

/// Withdraw one message from `msgch` and write it to `sink`.
pub async fn read_message_into(msgch: &mut RendezvousReceiver<String>, sink: &dyn NoticeSink) {
    match msgch.recv().await {
        Some(msg) => sink.line(&msg),
        None => warn!("Message channel closed before a message arrived"),
    }
}
