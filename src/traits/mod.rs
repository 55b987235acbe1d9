//! Trait definitions for workers and device transports.
//!
//! These abstractions let the gateway:
//! - Route commands to interchangeable device workers
//! - Talk to devices over real sockets or scripted mocks
//!
//! # Submodules
//!
//! - `worker`: the [`Worker`] capability (command list, execute, telemetry, logger)
//! - `network`: [`Connector`] for raw TCP devices, [`WebClient`] for the PDU

pub mod network;
pub mod worker;

pub use network::*;
pub use worker::*;
