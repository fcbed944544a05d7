//! Direction-typed rendezvous channels.
//!
//! A rendezvous channel hands a value from a sender to a receiver with no
//! buffering visible to the sender: `send` only returns once a receiver has
//! taken the value and completed the hand-off. Sending and receiving are
//! separate handle types, so a function that is given a
//! [`RendezvousSender`] can never receive and vice versa.
//!
//! Built on a `tokio::sync::mpsc` slot plus a `oneshot` acknowledgement per
//! hand-off.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Hand-offs that may be parked ahead of the receiver.
///
/// The parked sender still waits for the acknowledgement, so producers
/// cannot outrun the receiver, and a parked value whose sender gives up is
/// discarded unseen.
const HANDOFF_SLOTS: usize = 1;

/// Errors returned by [`RendezvousSender::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The receiving side was dropped before the value was handed over.
    #[error("receiving side of the channel is closed")]
    Closed,

    /// The receiver took the hand-off but dropped it without completing it.
    #[error("receiver dropped the hand-off without completing it")]
    Abandoned,
}

/// A value in transit together with the acknowledgement that releases its
/// sender.
#[derive(Debug)]
pub struct Handoff<T> {
    value: T,
    ack: HandoffAck,
}

/// Releases the sender of a [`Handoff`] when completed.
///
/// Dropping it without calling [`complete`](HandoffAck::complete) makes the
/// sender observe [`ChannelError::Abandoned`].
#[derive(Debug)]
pub struct HandoffAck(oneshot::Sender<()>);

impl<T> Handoff<T> {
    /// Borrow the value carried by this hand-off.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Complete the hand-off right away and take the value.
    pub fn complete(self) -> T {
        self.ack.complete();
        self.value
    }

    /// Split into the value and the acknowledgement, so the receiver can act
    /// on the value before releasing the sender.
    pub fn into_parts(self) -> (T, HandoffAck) {
        (self.value, self.ack)
    }

    /// Whether the sender stopped waiting for this hand-off.
    pub fn is_abandoned(&self) -> bool {
        self.ack.is_abandoned()
    }
}

impl HandoffAck {
    /// Release the waiting sender.
    pub fn complete(self) {
        // The sender may have given up waiting; nothing to report then.
        let _ = self.0.send(());
    }

    /// Whether the sender stopped waiting, e.g. its `send` future was
    /// dropped by a timeout. An abandoned value must not be acted on.
    pub fn is_abandoned(&self) -> bool {
        self.0.is_closed()
    }
}

/// Send-only handle of a rendezvous channel.
///
/// Cloneable; every clone feeds the same receiver.
#[derive(Debug)]
pub struct RendezvousSender<T> {
    tx: mpsc::Sender<Handoff<T>>,
}

impl<T> Clone for RendezvousSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> RendezvousSender<T> {
    /// Hand `value` to the receiver.
    ///
    /// Suspends until the receiver has taken the value and completed the
    /// hand-off. There is no deadline; wrap the call in
    /// `tokio::time::timeout` to bound it. Dropping the returned future
    /// withdraws the value: receivers skip hand-offs whose sender is gone.
    pub async fn send(&self, value: T) -> Result<(), ChannelError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let handoff = Handoff {
            value,
            ack: HandoffAck(ack_tx),
        };
        self.tx
            .send(handoff)
            .await
            .map_err(|_| ChannelError::Closed)?;
        ack_rx.await.map_err(|_| ChannelError::Abandoned)
    }

    /// Whether the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receive-only handle of a rendezvous channel.
#[derive(Debug)]
pub struct RendezvousReceiver<T> {
    rx: mpsc::Receiver<Handoff<T>>,
}

impl<T> RendezvousReceiver<T> {
    /// Wait for the next value and complete its hand-off immediately.
    ///
    /// Returns `None` once every sender has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        self.recv_handoff().await.map(Handoff::complete)
    }

    /// Wait for the next hand-off without completing it.
    ///
    /// The sender stays suspended until the returned [`Handoff`] is
    /// completed. Hand-offs whose sender already stopped waiting are
    /// discarded, so a value is only ever received while its sender is
    /// still blocked on it.
    pub async fn recv_handoff(&mut self) -> Option<Handoff<T>> {
        loop {
            let handoff = self.rx.recv().await?;
            if !handoff.is_abandoned() {
                return Some(handoff);
            }
        }
    }

    /// Stop accepting new hand-offs. Already parked ones can still be
    /// received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Create a rendezvous channel and return its two direction-typed halves.
pub fn rendezvous<T>() -> (RendezvousSender<T>, RendezvousReceiver<T>) {
    let (tx, rx) = mpsc::channel(HANDOFF_SLOTS);
    (RendezvousSender { tx }, RendezvousReceiver { rx })
}

/// A bidirectional rendezvous channel.
///
/// Both capabilities live here; hand out the restricted halves with
/// [`sender`](Channel::sender), [`receiver`](Channel::receiver) or
/// [`split`](Channel::split). Because the channel keeps its own sender,
/// [`recv`](Channel::recv) never observes closure while it is intact.
/// Sending goes through a handle from [`sender`](Channel::sender), since a
/// send on the channel itself could never meet its own receiver.
#[derive(Debug)]
pub struct Channel<T> {
    tx: RendezvousSender<T>,
    rx: RendezvousReceiver<T>,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        let (tx, rx) = rendezvous();
        Self { tx, rx }
    }

    /// A send-only handle to this channel.
    pub fn sender(&self) -> RendezvousSender<T> {
        self.tx.clone()
    }

    /// The receive-only side of this channel.
    pub fn receiver(&mut self) -> &mut RendezvousReceiver<T> {
        &mut self.rx
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Give up the bidirectional view and take both halves.
    pub fn split(self) -> (RendezvousSender<T>, RendezvousReceiver<T>) {
        (self.tx, self.rx)
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sender handle for user identifiers entering the registry.
pub type IntakeSender = RendezvousSender<String>;
/// Receiver handle for user identifiers entering the registry.
pub type IntakeReceiver = RendezvousReceiver<String>;

/// Create a new intake channel.
///
/// Returns a (sender, receiver) pair. Multiple producers can be cloned
/// from the returned sender; the receiver belongs to the event loop.
pub fn intake_channel() -> (IntakeSender, IntakeReceiver) {
    rendezvous()
}
