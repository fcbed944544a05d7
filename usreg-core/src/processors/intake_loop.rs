//! IntakeLoop processor.
//!
//! The IntakeLoop is the only task that drains the intake channel. It is
//! responsible for:
//! - Receiving identifiers one hand-off at a time
//! - Storing each identifier under its own key via the `Processor` trait
//! - Emitting `adding new user <identifier>` for every admission
//! - Releasing the producer only after the admission has been applied
//!
//! It stops when shutdown is signaled, when the shutdown sender is dropped,
//! or when every intake sender is gone.

use crate::events::{Admission, AdmissionNotice, IntakeReceiver};
use crate::notice::NoticeSink;
use crate::registry::UserTable;
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Single writer for intake admissions.
///
/// The shutdown and intake receivers are injected when calling
/// [`run()`](IntakeLoop::run) rather than owned by the struct.
pub struct IntakeLoop {
    users: UserTable,
    notices: Arc<dyn NoticeSink>,
}

impl IntakeLoop {
    /// Create a new IntakeLoop writing to `users` and reporting to `notices`.
    pub fn new(users: UserTable, notices: Arc<dyn NoticeSink>) -> Self {
        Self { users, notices }
    }

    /// Run the loop until shutdown is signaled or the intake closes.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>, mut intake_rx: IntakeReceiver) {
        if *shutdown_rx.borrow_and_update() {
            info!("IntakeLoop shut down before it started");
            return;
        }
        info!("IntakeLoop started");

        loop {
            tokio::select! {
                biased;

                // Shutdown has highest priority.
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("IntakeLoop received shutdown signal");
                        break;
                    }
                }

                handoff = intake_rx.recv_handoff() => {
                    // All senders dropped.
                    let Some(handoff) = handoff else {
                        info!("Intake channel closed");
                        break;
                    };
                    let (user, ack) = handoff.into_parts();
                    if ack.is_abandoned() {
                        debug!(%user, "Producer stopped waiting, dropping admission");
                        continue;
                    }
                    let _ = self.process(Admission::intake(user)).await;
                    ack.complete();
                }
            }
        }

        // Parked producers are released with an error when the receiver drops.
        intake_rx.close();
        info!("IntakeLoop shutdown complete");
    }
}

impl Processor<Admission> for IntakeLoop {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, admission: Admission) -> Result<(), Infallible> {
        let previous = self.users.apply(&admission);
        debug!(
            user = %admission.user,
            path = %admission.path,
            replaced = previous.is_some(),
            "Admission applied"
        );
        self.notices
            .line(&AdmissionNotice { user: &admission.user }.to_string());
        Ok(())
    }
}
