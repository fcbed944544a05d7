//! Event system for user admissions.
//!
//! This module provides the admission event types and the rendezvous
//! channel infrastructure that carries identifiers into the registry.
//!
//! # Event Flow
//!
//! 1. Producers send identifiers on the intake channel (`IntakeSender`)
//! 2. `IntakeLoop` receives them, writes the `UserTable`, emits a notice
//! 3. The producer is released once the admission has been applied
//!
//! Direct admissions skip the channel and write the `UserTable` directly.

pub mod channels;
pub mod types;

pub use channels::{
    Channel, ChannelError, Handoff, HandoffAck, IntakeReceiver, IntakeSender, RendezvousReceiver,
    RendezvousSender, intake_channel, rendezvous,
};

pub use types::{Admission, AdmissionNotice, AdmissionPath, DIRECT_VALUE_SUFFIX};
