//! Typed commands for every worker.
//!
//! Each ACC line is resolved to one of three tagged enums, one per device:
//!
//! - [`BrickCommand`]: motion (`BRICKCAL`, `BRICKMOVE`, ...)
//! - [`BbCommand`]: LNA bias (`LNAGATEA`, `LNADRAIN`, ...)
//! - [`PduCommand`]: power outlets (`OUTLET`, `ND-ON`, `ND-OFF`)
//!
//! Parsing checks arity, number types and ranges up front, so a command that
//! parses is safe to send. A failure yields a [`UsageError`] naming the
//! command; no device I/O happens in that case.
//!
//! ```rust
//! use feanta_bridge::commands::{Axis, BrickCommand};
//!
//! let cmd = BrickCommand::parse(&["BRICKMOVE", "1", "12.5"]).unwrap();
//! assert_eq!(cmd, BrickCommand::Move { axis: Axis::Z, position: 12.5 });
//!
//! // Axis 2 does not exist
//! assert!(BrickCommand::parse(&["BRICKMOVE", "2", "12.5"]).is_err());
//! ```

use crate::error::UsageError;
use crate::parsing::{expect_arity, parse_float, parse_int};

// ============================================================================
// Axes
// ============================================================================

/// One of the three controlled motor axes.
///
/// Axes are addressed by motor number on the controller (1, 3, 4) and by a
/// coordinate letter inside motion programs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    /// Motor 1, linear focus (mm).
    Z,
    /// Motor 3, rotation (degrees).
    A,
    /// Motor 4, linear lateral (mm).
    X,
}

impl Axis {
    /// All axes in controller order.
    pub const ALL: [Axis; 3] = [Axis::Z, Axis::A, Axis::X];

    /// Resolve a motor number.
    pub const fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Axis::Z),
            3 => Some(Axis::A),
            4 => Some(Axis::X),
            _ => None,
        }
    }

    /// Motor number on the controller.
    pub const fn number(self) -> u8 {
        match self {
            Axis::Z => 1,
            Axis::A => 3,
            Axis::X => 4,
        }
    }

    /// Coordinate-system letter used in motion programs.
    pub const fn coordinate(self) -> char {
        match self {
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::X => 'X',
        }
    }

    /// Key used for this axis in telemetry snapshots.
    pub const fn label(self) -> &'static str {
        match self {
            Axis::Z => "AXIS1",
            Axis::A => "AXIS3",
            Axis::X => "AXIS4",
        }
    }
}

fn parse_axis(command: &str, token: &str) -> Result<Axis, UsageError> {
    let n = parse_int(command, token)?;
    Axis::from_number(n).ok_or_else(|| UsageError::Axis {
        command: command.to_string(),
        axis: n,
    })
}

fn not_owned(command: &str) -> UsageError {
    UsageError::NotOwned {
        command: command.to_string(),
    }
}

// ============================================================================
// Brick
// ============================================================================

/// Motion controller command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BrickCommand {
    /// Home all axes against their positive limits.
    Cal,
    /// Absolute move of one axis, in physical units.
    Move {
        /// Axis to move.
        axis: Axis,
        /// Destination (mm, or degrees for the rotation axis).
        position: f64,
    },
    /// Relative move of one axis, in physical units.
    Off {
        /// Axis to move.
        axis: Axis,
        /// Offset (mm, or degrees for the rotation axis).
        offset: f64,
    },
    /// Kill and re-arm one motor.
    ///
    /// Braking wears the mechanism; the ACC is expected to rate-limit this.
    Halt {
        /// Axis to halt.
        axis: Axis,
    },
    /// Absolute move of all three axes, ordered 1, 3, 4.
    Loc {
        /// Destinations for axes 1, 3 and 4.
        positions: [f64; 3],
    },
    /// Absolute move of the rotation axis.
    Angle {
        /// Destination angle in degrees.
        angle: f64,
    },
    /// Controller reset.
    Reset,
}

impl BrickCommand {
    /// Command names owned by the Brick worker.
    pub const NAMES: [&'static str; 7] = [
        "BRICKCAL",
        "BRICKHALT",
        "BRICKMOVE",
        "BRICKOFF",
        "BRICKLOC",
        "BRICKANGLE",
        "BRICKRESET",
    ];

    /// Parse a tokenized command line.
    pub fn parse(tokens: &[&str]) -> Result<Self, UsageError> {
        let name = tokens.first().copied().unwrap_or_default();
        match name {
            "BRICKCAL" => {
                expect_arity(tokens, 0)?;
                Ok(Self::Cal)
            }
            "BRICKMOVE" => {
                expect_arity(tokens, 2)?;
                Ok(Self::Move {
                    axis: parse_axis(name, tokens[1])?,
                    position: parse_float(name, tokens[2])?,
                })
            }
            "BRICKOFF" => {
                expect_arity(tokens, 2)?;
                Ok(Self::Off {
                    axis: parse_axis(name, tokens[1])?,
                    offset: parse_float(name, tokens[2])?,
                })
            }
            "BRICKHALT" => {
                expect_arity(tokens, 1)?;
                Ok(Self::Halt {
                    axis: parse_axis(name, tokens[1])?,
                })
            }
            "BRICKLOC" => {
                expect_arity(tokens, 3)?;
                Ok(Self::Loc {
                    positions: [
                        parse_float(name, tokens[1])?,
                        parse_float(name, tokens[2])?,
                        parse_float(name, tokens[3])?,
                    ],
                })
            }
            "BRICKANGLE" => {
                expect_arity(tokens, 1)?;
                Ok(Self::Angle {
                    angle: parse_float(name, tokens[1])?,
                })
            }
            "BRICKRESET" => {
                expect_arity(tokens, 0)?;
                Ok(Self::Reset)
            }
            other => Err(not_owned(other)),
        }
    }

    /// ACC name of this command.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cal => "BRICKCAL",
            Self::Move { .. } => "BRICKMOVE",
            Self::Off { .. } => "BRICKOFF",
            Self::Halt { .. } => "BRICKHALT",
            Self::Loc { .. } => "BRICKLOC",
            Self::Angle { .. } => "BRICKANGLE",
            Self::Reset => "BRICKRESET",
        }
    }
}

// ============================================================================
// BB
// ============================================================================

/// Bias-controlled LNA terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BiasTerminal {
    /// Gate A voltage.
    GateA,
    /// Gate B voltage.
    GateB,
    /// Drain voltage.
    Drain,
}

impl BiasTerminal {
    /// Terminal keyword in the BB line protocol.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::GateA => "gatea",
            Self::GateB => "gateb",
            Self::Drain => "drain",
        }
    }
}

/// Number of LNAs on the bias board.
pub const AMPLIFIER_COUNT: usize = 4;

/// LNA bias controller command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BbCommand {
    /// Set a terminal voltage on one amplifier.
    SetVoltage {
        /// Which terminal.
        terminal: BiasTerminal,
        /// Amplifier index (0..=3).
        amp: u8,
        /// Requested voltage, before scaling.
        volts: f64,
    },
    /// Switch amplifier bias power.
    Bias {
        /// Amplifier index (0..=3).
        amp: u8,
        /// Power on.
        on: bool,
    },
}

impl BbCommand {
    /// Command names owned by the BB worker.
    pub const NAMES: [&'static str; 4] = ["LNAGATEA", "LNAGATEB", "LNADRAIN", "LNABIAS"];

    /// Parse a tokenized command line.
    pub fn parse(tokens: &[&str]) -> Result<Self, UsageError> {
        let name = tokens.first().copied().unwrap_or_default();
        let terminal = match name {
            "LNAGATEA" => Some(BiasTerminal::GateA),
            "LNAGATEB" => Some(BiasTerminal::GateB),
            "LNADRAIN" => Some(BiasTerminal::Drain),
            "LNABIAS" => None,
            other => return Err(not_owned(other)),
        };
        expect_arity(tokens, 2)?;
        let amp = parse_amp(name, tokens[1])?;

        match terminal {
            Some(terminal) => Ok(Self::SetVoltage {
                terminal,
                amp,
                volts: parse_float(name, tokens[2])?,
            }),
            None => Ok(Self::Bias {
                amp,
                on: parse_switch(name, tokens[2])?,
            }),
        }
    }

    /// ACC name of this command.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetVoltage { terminal, .. } => match terminal {
                BiasTerminal::GateA => "LNAGATEA",
                BiasTerminal::GateB => "LNAGATEB",
                BiasTerminal::Drain => "LNADRAIN",
            },
            Self::Bias { .. } => "LNABIAS",
        }
    }
}

fn parse_amp(command: &str, token: &str) -> Result<u8, UsageError> {
    let n = parse_int(command, token)?;
    match u8::try_from(n) {
        Ok(amp) if usize::from(amp) < AMPLIFIER_COUNT => Ok(amp),
        _ => Err(UsageError::Amplifier {
            command: command.to_string(),
            amp: n,
        }),
    }
}

fn parse_switch(command: &str, token: &str) -> Result<bool, UsageError> {
    match parse_int(command, token)? {
        0 => Ok(false),
        1 => Ok(true),
        state => Err(UsageError::State {
            command: command.to_string(),
            state,
        }),
    }
}

// ============================================================================
// PDU
// ============================================================================

/// Number of switched outlets on the PDU.
pub const OUTLET_COUNT: u8 = 8;

/// Power distribution unit command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PduCommand {
    /// Switch one outlet.
    Outlet {
        /// Outlet number (1..=8).
        outlet: u8,
        /// Power on.
        on: bool,
    },
    /// Switch the noise-diode outlet.
    NoiseDiode {
        /// Power on.
        on: bool,
    },
}

impl PduCommand {
    /// Command names owned by the PDU worker.
    pub const NAMES: [&'static str; 3] = ["OUTLET", "ND-ON", "ND-OFF"];

    /// Parse a tokenized command line.
    pub fn parse(tokens: &[&str]) -> Result<Self, UsageError> {
        let name = tokens.first().copied().unwrap_or_default();
        match name {
            "OUTLET" => {
                expect_arity(tokens, 2)?;
                let n = parse_int(name, tokens[1])?;
                let outlet = match u8::try_from(n) {
                    Ok(outlet) if (1..=OUTLET_COUNT).contains(&outlet) => outlet,
                    _ => {
                        return Err(UsageError::Outlet {
                            command: name.to_string(),
                            outlet: n,
                        })
                    }
                };
                Ok(Self::Outlet {
                    outlet,
                    on: parse_switch(name, tokens[2])?,
                })
            }
            "ND-ON" | "ND-OFF" => {
                expect_arity(tokens, 0)?;
                Ok(Self::NoiseDiode {
                    on: name == "ND-ON",
                })
            }
            other => Err(not_owned(other)),
        }
    }
}
