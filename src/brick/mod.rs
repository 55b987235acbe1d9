//! GeoBrick motion controller support.
//!
//! - [`frame`]: binary request framing for the controller's TCP port
//! - [`macros`]: motion programs built from validated commands
//! - [`telemetry`]: per-axis register polling
//! - [`BrickWorker`]: the [`Worker`](crate::traits::Worker) tying these together

pub mod frame;
pub mod macros;
pub mod telemetry;
mod worker;

pub use frame::{command_frame, Request, RequestType};
pub use macros::MacroBuilder;
pub use telemetry::{Poller, Register, RegisterKind, REGISTERS};
pub use worker::BrickWorker;
