//! Event processors.
//!
//! - `IntakeLoop`: receives identifiers from the intake channel, applies
//!   them to the `UserTable` and emits admission notices

pub mod intake_loop;

pub use intake_loop::IntakeLoop;
