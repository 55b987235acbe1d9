//! # feanta-bridge
//!
//! Command gateway between the array control computer (ACC) and the FEANTA
//! front-end hardware: the GeoBrick motion controller, the LNA bias board
//! (BB) and the web-controlled power distribution unit (PDU).
//!
//! ## Features
//!
//! - **Single command port**: the ACC sends one text command per TCP
//!   connection; the gateway echoes the command name and runs it
//! - **Device workers**: each device owns a fixed set of command names and
//!   validates arguments before touching the network
//! - **Telemetry**: workers that support it contribute to a merged
//!   [`Stateframe`]
//! - **Testable transports**: every device talks through a trait, with mocks
//!   in [`hal::mock`]
//!
//! ## Architecture
//!
//! - `listener` - Serial TCP server, one command per connection
//! - `registry` - Routes command names to workers
//! - `brick`, `bb`, `pdu` - Device workers and their wire protocols
//! - `commands` - Typed, validated commands for each device
//! - `traits` - Worker and transport abstractions
//! - `hal` - TCP, HTTP and mock transports
//!
//! ## Example
//!
//! ```rust
//! use feanta_bridge::{
//!     brick::BrickWorker,
//!     config::BrickConfig,
//!     hal::MockConnector,
//!     Journal, WorkerRegistry,
//! };
//!
//! let link = MockConnector::new().with_replies([b"\x06".to_vec(), b"\x06".to_vec()]);
//! let mut registry = WorkerRegistry::new(Journal::silent())
//!     .with_worker(BrickWorker::new(link.clone(), BrickConfig::default()))
//!     .unwrap();
//!
//! registry.dispatch(&["BRICKMOVE", "1", "12.5"]).unwrap();
//! assert_eq!(link.connection_count(), 2);
//!
//! // Unknown names never reach a device
//! assert!(registry.dispatch(&["FOO"]).is_err());
//! assert_eq!(link.connection_count(), 2);
//! ```

#![warn(missing_docs)]

/// Bias board worker and telemetry decoding.
pub mod bb;
/// GeoBrick framing, motion programs, telemetry and worker.
pub mod brick;
/// Typed device commands and argument validation.
pub mod commands;
/// Gateway configuration with deployed defaults.
pub mod config;
/// Error types.
pub mod error;
/// Transport implementations, including mocks for testing.
pub mod hal;
/// Injectable log sink.
pub mod journal;
/// ACC command listener.
pub mod listener;
/// Tokenizing, numeric argument parsing and number rendering.
pub mod parsing;
/// Power distribution unit worker.
pub mod pdu;
/// Command-name routing to workers.
pub mod registry;
/// Telemetry snapshot types.
pub mod stateframe;
/// Worker and transport traits.
pub mod traits;

// Re-exports for convenience
pub use commands::{Axis, BbCommand, BiasTerminal, BrickCommand, PduCommand};
pub use config::{BbConfig, BrickConfig, Config, ListenerConfig, PduConfig};
pub use error::{GatewayError, GatewayResult, UsageError};
pub use journal::Journal;
pub use listener::Listener;
pub use registry::WorkerRegistry;
pub use stateframe::{Reading, Record, Stateframe};
pub use traits::{Connector, WebClient, WebSessionFactory, Worker};
