//! The device worker capability.
//!
//! A worker owns one device and a fixed set of ACC command names. The
//! [`WorkerRegistry`](crate::registry::WorkerRegistry) routes each command
//! line to the worker that declared its name.
//!
//! # Contract
//!
//! - [`Worker::commands`] is fixed for the worker's lifetime.
//! - [`Worker::execute`] validates argument count and types before opening
//!   any connection; on failure it logs a usage message and does no I/O.
//! - [`Worker::stateframe_query`] never changes device state. Workers without
//!   telemetry keep the default, which returns `None`.

use crate::error::GatewayResult;
use crate::journal::Journal;
use crate::stateframe::Stateframe;

/// One device's command handler.
pub trait Worker {
    /// Name used in log messages and registration errors.
    fn name(&self) -> &str;

    /// ACC command names this worker owns.
    fn commands(&self) -> &[&'static str];

    /// Run one tokenized command line. `tokens[0]` is the command name.
    fn execute(&mut self, tokens: &[&str]) -> GatewayResult<()>;

    /// Poll the device for a telemetry snapshot, if supported.
    fn stateframe_query(&mut self) -> Option<GatewayResult<Stateframe>> {
        None
    }

    /// Replace the journal this worker logs to.
    fn set_logger(&mut self, journal: Journal);
}
