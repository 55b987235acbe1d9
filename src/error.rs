//! Error types for the gateway.
//!
//! Three classes of failure exist and none of them is fatal to the listener:
//!
//! - **Malformed input** ([`UsageError`]): wrong argument count or type, an
//!   out-of-range axis/amplifier/outlet. Raised before any device I/O.
//! - **Device unreachable** ([`GatewayError::Resolve`], [`GatewayError::Io`],
//!   [`GatewayError::Http`], [`GatewayError::LoginRejected`]): the remaining
//!   exchanges of the command are abandoned.
//! - **Telemetry decode failures** never surface as errors; they are counted
//!   in the [`Stateframe`](crate::stateframe::Stateframe) instead.

use thiserror::Error;

/// Convenience alias for results using the gateway error type.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A command line that failed validation.
///
/// Every variant carries the command name so the logged usage message is
/// specific to the command that was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    /// Token count does not match the command's arity.
    #[error("Invalid call to {command}: expected {expected} argument(s), got {got}")]
    Arity {
        /// Command name.
        command: String,
        /// Required argument count (excluding the command name).
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },

    /// A positional argument did not parse as the required number type.
    #[error("Invalid call to {command}: '{token}' is not a valid {kind}")]
    Number {
        /// Command name.
        command: String,
        /// Offending token.
        token: String,
        /// Expected kind ("integer" or "number").
        kind: &'static str,
    },

    /// Motor index outside the three controlled axes.
    #[error("Invalid call to {command}: axis {axis} is not one of 1, 3, 4")]
    Axis {
        /// Command name.
        command: String,
        /// Supplied motor index.
        axis: i64,
    },

    /// Amplifier index outside 0..=3.
    #[error("Invalid call to {command}: amplifier {amp} is not in 0..=3")]
    Amplifier {
        /// Command name.
        command: String,
        /// Supplied amplifier index.
        amp: i64,
    },

    /// Outlet number outside 1..=8.
    #[error("Invalid call to {command}: outlet {outlet} is not in 1..=8")]
    Outlet {
        /// Command name.
        command: String,
        /// Supplied outlet number.
        outlet: i64,
    },

    /// On/off state that is neither 0 nor 1.
    #[error("Invalid call to {command}: state {state} must be 0 or 1")]
    State {
        /// Command name.
        command: String,
        /// Supplied state.
        state: i64,
    },

    /// The worker was asked to run a command it does not own.
    #[error("{command} is not handled by this worker")]
    NotOwned {
        /// Command name.
        command: String,
    },
}

/// Brick frame encoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Payload plus terminator does not fit in the 16-bit length field.
    #[error("payload of {len} bytes exceeds the frame length field")]
    PayloadTooLong {
        /// Payload length in bytes.
        len: usize,
    },
}

/// Primary error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Command line failed validation; no device I/O was attempted.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A program could not be wrapped in a wire frame.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Device hostname did not resolve.
    #[error("{host} could not be resolved")]
    Resolve {
        /// Hostname that failed.
        host: String,
    },

    /// Socket failure: refused, reset or timed out.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request to the PDU failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// PDU login did not land on the index page.
    #[error("login rejected, landed on {landing}")]
    LoginRejected {
        /// URL the session ended up on.
        landing: String,
    },

    /// Two workers claim the same command name.
    #[error("command {command} already registered by {existing}, rejected for {incoming}")]
    DuplicateCommand {
        /// Conflicting command name.
        command: String,
        /// Worker that already owns the name.
        existing: String,
        /// Worker that attempted to claim it.
        incoming: String,
    },

    /// No worker owns this command name.
    #[error("Unrecognized command received: {0}.")]
    UnknownCommand(String),

    /// Blank command line.
    #[error("empty command line")]
    EmptyCommand,

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether this error was raised before any device traffic.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Usage(_) | Self::UnknownCommand(_) | Self::EmptyCommand
        )
    }
}
