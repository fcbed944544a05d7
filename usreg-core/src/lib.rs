#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod events;
pub mod messaging;
pub mod notice;
pub mod processors;
pub mod registry;

pub use registry::{Registry, RegistryError, UserTable};
