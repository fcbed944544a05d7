//! The user registry.
//!
//! A [`Registry`] owns the user mapping and the intake channel. Admissions
//! arrive either over the intake channel, where the event loop started by
//! [`Registry::start`] applies them one at a time, or through
//! [`Registry::admit_direct`], which writes the mapping from the calling
//! thread. Both pathways go through the [`UserTable`] lock.

mod table;

pub use table::UserTable;

use crate::events::{Admission, ChannelError, IntakeReceiver, IntakeSender, intake_channel};
use crate::notice::{NoticeSink, StdoutSink};
use crate::processors::IntakeLoop;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors surfaced by registry lifecycle and intake operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `start` was called on a registry whose event loop is already running
    /// (or has run).
    #[error("registry event loop already started")]
    AlreadyStarted,

    /// The event loop is gone, so the intake hand-off could not complete.
    #[error("intake channel failed: {0}")]
    Intake(#[from] ChannelError),
}

/// In-memory user registry with a single-writer intake loop.
pub struct Registry {
    users: UserTable,
    notices: Arc<dyn NoticeSink>,
    intake_tx: IntakeSender,
    /// Taken by `start`; `None` afterwards.
    intake_rx: Mutex<Option<IntakeReceiver>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Registry {
    /// Create a registry with an empty mapping whose admission notices go to
    /// standard output.
    pub fn new() -> Self {
        Self::with_notice_sink(Arc::new(StdoutSink))
    }

    /// Create a registry that emits admission notices to `notices`.
    pub fn with_notice_sink(notices: Arc<dyn NoticeSink>) -> Self {
        let (intake_tx, intake_rx) = intake_channel();
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            users: UserTable::new(),
            notices,
            intake_tx,
            intake_rx: Mutex::new(Some(intake_rx)),
            shutdown_tx,
        }
    }

    /// Spawn the event loop onto the current Tokio runtime and return
    /// immediately.
    ///
    /// Only the first call spawns a loop; later calls return
    /// [`RegistryError::AlreadyStarted`].
    pub fn start(&self) -> Result<JoinHandle<()>, RegistryError> {
        let intake_rx = self
            .intake_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RegistryError::AlreadyStarted)?;

        let intake_loop = IntakeLoop::new(self.users.clone(), Arc::clone(&self.notices));
        let shutdown_rx = self.shutdown_tx.subscribe();

        info!("Starting registry event loop");
        Ok(tokio::spawn(intake_loop.run(shutdown_rx, intake_rx)))
    }

    /// Store `user` with the direct-admission value, bypassing the intake
    /// channel. No notice is emitted.
    pub fn admit_direct(&self, user: impl Into<String>) {
        let admission = Admission::direct(user);
        let previous = self.users.apply(&admission);
        debug!(
            user = %admission.user,
            replaced = previous.is_some(),
            "Direct admission applied"
        );
    }

    /// Hand `user` to the event loop.
    ///
    /// Suspends until the loop has stored the identifier and emitted its
    /// notice. Before [`start`](Registry::start) there is no receiver, so
    /// this waits indefinitely.
    pub async fn admit(&self, user: impl Into<String>) -> Result<(), RegistryError> {
        self.intake_tx.send(user.into()).await?;
        Ok(())
    }

    /// A send-only handle to the intake channel for independent producers.
    pub fn intake(&self) -> IntakeSender {
        self.intake_tx.clone()
    }

    /// Ask the event loop to stop.
    ///
    /// The loop finishes the admission it is applying, then exits; hand-offs
    /// still waiting are released with an error. Calling this before
    /// `start` makes the loop exit as soon as it is started.
    pub fn shutdown(&self) {
        info!("Registry shutdown requested");
        self.shutdown_tx.send_replace(true);
    }

    pub fn get(&self, user: &str) -> Option<String> {
        self.users.get(user)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.users.contains(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Copy of the current mapping ordered by identifier.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.users.snapshot()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::MemorySink;
    use std::time::Duration;
    use tokio::time::timeout;

    const BUDGET: Duration = Duration::from_millis(100);

    fn registry_with_sink() -> (Registry, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let registry = Registry::with_notice_sink(sink.clone());
        (registry, sink)
    }

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_single_intake_admission() {
        let (registry, sink) = registry_with_sink();
        registry.start().unwrap();

        registry.admit("alice").await.unwrap();

        assert_eq!(registry.snapshot(), map(&[("alice", "alice")]));
        assert_eq!(sink.lines(), vec!["adding new user alice"]);
    }

    #[tokio::test]
    async fn test_mixed_pathways() {
        let (registry, sink) = registry_with_sink();
        registry.start().unwrap();

        registry.admit("bob").await.unwrap();
        registry.admit_direct("carol");

        assert_eq!(
            registry.snapshot(),
            map(&[("bob", "bob"), ("carol", "carolvalue")])
        );
        // Direct admissions are silent.
        assert_eq!(sink.lines(), vec!["adding new user bob"]);
    }

    #[tokio::test]
    async fn test_direct_admission_before_start() {
        let (registry, sink) = registry_with_sink();
        registry.admit_direct("carol");

        assert_eq!(registry.get("carol").as_deref(), Some("carolvalue"));
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_single_producer_notices_in_order() {
        let (registry, sink) = registry_with_sink();
        registry.start().unwrap();

        for user in ["a", "b", "c"] {
            registry.admit(user).await.unwrap();
        }

        assert_eq!(
            sink.lines(),
            vec!["adding new user a", "adding new user b", "adding new user c"]
        );
        assert_eq!(registry.snapshot(), map(&[("a", "a"), ("b", "b"), ("c", "c")]));
    }

    #[tokio::test]
    async fn test_intake_before_start_waits_indefinitely() {
        let (registry, sink) = registry_with_sink();
        let registry = Arc::new(registry);

        let pending = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.admit("dave").await })
        };

        assert!(timeout(BUDGET, pending).await.is_err());
        assert!(!registry.contains("dave"));
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_parked_intake_is_applied_once_started() {
        let (registry, _sink) = registry_with_sink();
        let registry = Arc::new(registry);

        let pending = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.admit("erin").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        registry.start().unwrap();
        timeout(BUDGET, pending).await.unwrap().unwrap().unwrap();
        assert_eq!(registry.get("erin").as_deref(), Some("erin"));
    }

    #[tokio::test]
    async fn test_timed_out_intake_before_start_is_withdrawn() {
        let (registry, sink) = registry_with_sink();

        assert!(timeout(BUDGET, registry.admit("ghost")).await.is_err());

        registry.start().unwrap();
        registry.admit("alice").await.unwrap();

        assert_eq!(registry.snapshot(), map(&[("alice", "alice")]));
        assert_eq!(sink.lines(), vec!["adding new user alice"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_direct_and_intake_admissions_interleave_safely() {
        const USERS: usize = 50;
        let (registry, sink) = registry_with_sink();
        let registry = Arc::new(registry);
        registry.start().unwrap();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let intake = registry.intake();
                tokio::spawn(async move {
                    for i in (p..USERS).step_by(4) {
                        intake.send(format!("intake-{i}")).await.unwrap();
                        intake.send(format!("shared-{i}")).await.unwrap();
                    }
                })
            })
            .collect();
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let registry = Arc::clone(&registry);
                tokio::task::spawn_blocking(move || {
                    for i in (w..USERS).step_by(4) {
                        registry.admit_direct(format!("direct-{i}"));
                        registry.admit_direct(format!("shared-{i}"));
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.await.unwrap();
        }
        for writer in writers {
            writer.await.unwrap();
        }

        assert_eq!(registry.len(), 3 * USERS);
        assert_eq!(sink.lines().len(), 2 * USERS);
        for i in 0..USERS {
            let intake = format!("intake-{i}");
            let direct = format!("direct-{i}");
            let shared = format!("shared-{i}");
            assert_eq!(registry.get(&intake), Some(intake.clone()));
            assert_eq!(registry.get(&direct), Some(format!("{direct}value")));
            let value = registry.get(&shared).unwrap();
            assert!(value == shared || value == format!("{shared}value"));
        }
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let (registry, _sink) = registry_with_sink();
        registry.start().unwrap();

        assert!(matches!(
            registry.start(),
            Err(RegistryError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_producers_all_admitted() {
        let (registry, sink) = registry_with_sink();
        registry.start().unwrap();

        let producers: Vec<_> = (0..10)
            .map(|n| {
                let intake = registry.intake();
                tokio::spawn(async move { intake.send(format!("user-{n}")).await })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap().unwrap();
        }

        assert_eq!(registry.len(), 10);
        assert_eq!(sink.lines().len(), 10);
        for n in 0..10 {
            let user = format!("user-{n}");
            assert_eq!(registry.get(&user), Some(user.clone()));
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop_and_closes_intake() {
        let (registry, _sink) = registry_with_sink();
        let handle = registry.start().unwrap();
        registry.admit("frank").await.unwrap();

        registry.shutdown();
        timeout(BUDGET, handle).await.unwrap().unwrap();

        let err = registry.admit("grace").await.unwrap_err();
        assert!(matches!(err, RegistryError::Intake(ChannelError::Closed)));
        assert!(registry.contains("frank"));
        assert!(!registry.contains("grace"));
    }

    #[tokio::test]
    async fn test_shutdown_before_start_exits_immediately() {
        let (registry, _sink) = registry_with_sink();
        registry.shutdown();

        let handle = registry.start().unwrap();
        timeout(BUDGET, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_dropping_registry_ends_loop() {
        let (registry, _sink) = registry_with_sink();
        let handle = registry.start().unwrap();
        drop(registry);

        timeout(BUDGET, handle).await.unwrap().unwrap();
    }
}
