//! Motion-program builders, one per Brick command.
//!
//! Each builder turns a validated [`BrickCommand`] into an ordered list of
//! ASCII programs. Programs are sent one frame at a time and each reply is
//! awaited before the next frame goes out; several commands spread a single
//! PLC program across frames, so the order is load-bearing.
//!
//! Statements inside one program are separated by carriage returns.
//!
//! ```rust
//! use feanta_bridge::brick::MacroBuilder;
//! use feanta_bridge::commands::{Axis, BrickCommand};
//! use feanta_bridge::config::BrickConfig;
//!
//! let builder = MacroBuilder::new(&BrickConfig::default());
//! let programs = builder.programs(&BrickCommand::Move { axis: Axis::Z, position: 12.5 });
//! assert!(programs[0].ends_with("&1!Z12.5"));
//! assert_eq!(programs[1], "CLOSE ALL");
//! ```

use std::fmt::Display;

use crate::commands::{Axis, BrickCommand};
use crate::config::BrickConfig;
use crate::parsing::decimal;

/// Standalone program that closes any open program buffer.
pub const CLOSE_ALL: &str = "CLOSE ALL";

/// Dwell before the reset escape, in milliseconds.
pub const RESET_DWELL_MS: u32 = 2000;

/// Register cleared before a controller reset.
pub const RESET_REGISTER: &str = "M6014";

/// Statement list rendered into one program.
#[derive(Debug, Default)]
struct Program {
    statements: Vec<String>,
}

impl Program {
    fn new() -> Self {
        Self::default()
    }

    fn push(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Online command issued from inside a PLC.
    fn cmd(self, command: impl Display) -> Self {
        self.push(format!("CMD \"{}\"", command))
    }

    /// Stop jogging on every axis.
    fn stop_all(mut self) -> Self {
        for axis in Axis::ALL {
            self = self.push(format!("#{}J/", axis.number()));
        }
        self
    }

    /// Spin until `condition` becomes false.
    fn wait_while(self, condition: &str) -> Self {
        self.push(format!("WHILE ({})", condition))
            .push("WAIT")
            .push("ENDWHILE")
    }

    fn render(self) -> String {
        self.statements.join("\r")
    }
}

/// Absolute move of one axis in its coordinate system.
fn absolute_move(axis: Axis, target: f64) -> String {
    format!("&{}!{}{}", axis.number(), axis.coordinate(), decimal(target))
}

/// Status register for one motor, e.g. `M340` (motor 3, in-position).
fn status_bit(axis: Axis, suffix: &str) -> String {
    format!("M{}{}", axis.number(), suffix)
}

/// Builds motion programs from validated commands.
#[derive(Clone, Debug)]
pub struct MacroBuilder {
    plc_slot: u8,
    prog_slot: u8,
    motor3_home_counts: i64,
    motor4_home_counts: i64,
}

impl MacroBuilder {
    /// Builder using the slots and homing offsets from `config`.
    pub fn new(config: &BrickConfig) -> Self {
        Self {
            plc_slot: config.plc_slot,
            prog_slot: config.prog_slot,
            motor3_home_counts: config.motor3_home_counts,
            motor4_home_counts: config.motor4_home_counts,
        }
    }

    /// Programs for `command`, in send order.
    pub fn programs(&self, command: &BrickCommand) -> Vec<String> {
        match *command {
            BrickCommand::Cal => self.calibrate(),
            BrickCommand::Move { axis, position } => self.move_to(axis, position),
            BrickCommand::Off { axis, offset } => self.offset(axis, offset),
            BrickCommand::Halt { axis } => self.halt(axis),
            BrickCommand::Loc { positions } => self.locate(positions),
            BrickCommand::Angle { angle } => self.angle(angle),
            BrickCommand::Reset => self.reset(),
        }
    }

    /// Homing PLC: jog 3 and 4 to their positive limits, back off by the
    /// configured counts, zero, then enable the PLC.
    fn calibrate(&self) -> Vec<String> {
        let plc = self.plc_slot;
        let seek_limits = Program::new()
            .push(CLOSE_ALL)
            .push(format!("OPEN PLC {}", plc))
            .push("CLEAR")
            .cmd("#1J/")
            .cmd("#3J/")
            .cmd("#4J/")
            .cmd("#3J+")
            .cmd("#4J+")
            .wait_while(&format!(
                "{}=0 OR {}=0",
                status_bit(Axis::A, "31"),
                status_bit(Axis::X, "31")
            ))
            .render();

        let back_off = Program::new()
            .cmd("#1J/")
            .cmd("#3J/")
            .cmd("#4J/")
            .cmd("#3$*")
            .cmd("#4$*")
            .cmd("#3J/")
            .cmd("#4J/")
            .cmd(format!("#3J={}", self.motor3_home_counts))
            .cmd(format!("#4J={}", self.motor4_home_counts))
            .wait_while(&format!(
                "{}=0 OR {}=0",
                status_bit(Axis::A, "40"),
                status_bit(Axis::X, "40")
            ))
            .render();

        let finish = Program::new()
            .cmd("#1$*")
            .cmd("#3$*")
            .cmd("#4$*")
            .cmd("#1J/")
            .cmd("#3J/")
            .cmd("#4J/")
            .cmd(format!("DISABLE PLC {}", plc))
            .push("CLOSE")
            .push(format!("ENABLE PLC {}", plc))
            .render();

        vec![seek_limits, back_off, finish, CLOSE_ALL.to_string()]
    }

    fn move_to(&self, axis: Axis, position: f64) -> Vec<String> {
        let program = Program::new()
            .push(CLOSE_ALL)
            .stop_all()
            .push(absolute_move(axis, position))
            .render();
        vec![program, CLOSE_ALL.to_string()]
    }

    /// Incremental move run from a motion program, watched by a PLC that
    /// disables itself once the axis reports in-position.
    fn offset(&self, axis: Axis, offset: f64) -> Vec<String> {
        let (plc, prog) = (self.plc_slot, self.prog_slot);
        let motion = Program::new()
            .push(CLOSE_ALL)
            .stop_all()
            .push(format!("OPEN PROG {}", prog))
            .push("CLEAR")
            .push("INC")
            .push(format!("{}{}", axis.coordinate(), decimal(offset)))
            .push("CLOSE")
            .render();

        let watcher = Program::new()
            .push(format!("OPEN PLC {}", plc))
            .push("CLEAR")
            .push(format!("ADDRESS &{}#{}", axis.number(), axis.number()))
            .cmd(format!("B{}R", prog))
            .wait_while(&format!("{}=0", status_bit(axis, "40")))
            .render();

        let arm = Program::new()
            .cmd(format!("DISABLE PLC {}", plc))
            .push("CLOSE")
            .push(format!("ENABLE PLC {}", plc))
            .render();

        vec![motion, watcher, arm]
    }

    fn halt(&self, axis: Axis) -> Vec<String> {
        let program = Program::new()
            .push(CLOSE_ALL)
            .push(format!("#{}K", axis.number()))
            .push(format!("#{}J/", axis.number()))
            .render();
        vec![program, CLOSE_ALL.to_string()]
    }

    fn locate(&self, positions: [f64; 3]) -> Vec<String> {
        let mut program = Program::new().push(CLOSE_ALL).stop_all();
        for (axis, target) in Axis::ALL.into_iter().zip(positions) {
            program = program.push(absolute_move(axis, target));
        }
        vec![program.render(), CLOSE_ALL.to_string()]
    }

    fn angle(&self, angle: f64) -> Vec<String> {
        let program = Program::new()
            .push(CLOSE_ALL)
            .push(format!("#{}J/", Axis::A.number()))
            .push(absolute_move(Axis::A, angle))
            .render();
        vec![program, CLOSE_ALL.to_string()]
    }

    /// Scratch program that clears the reset register, dwells, then sends
    /// the `$$$` reset escape.
    fn reset(&self) -> Vec<String> {
        let prog = self.prog_slot;
        let program = Program::new()
            .push(CLOSE_ALL)
            .push(format!("OPEN PROG {}", prog))
            .push("CLEAR")
            .push(format!("{}=0", RESET_REGISTER))
            .push(format!("DWELL{}", RESET_DWELL_MS))
            .cmd("$$$")
            .push("CLOSE")
            .push(format!("B{}R", prog))
            .render();
        vec![program, CLOSE_ALL.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brick::frame::command_frame;

    fn builder() -> MacroBuilder {
        MacroBuilder::new(&BrickConfig::default())
    }

    #[test]
    fn move_uses_axis_coordinate() {
        let cases = [(Axis::Z, "&1!Z"), (Axis::A, "&3!A"), (Axis::X, "&4!X")];
        for (axis, prefix) in cases {
            let programs = builder().programs(&BrickCommand::Move {
                axis,
                position: -7.25,
            });
            assert!(programs[0].ends_with(&format!("{}-7.25", prefix)));
        }
    }

    #[test]
    fn move_stops_all_axes_first() {
        let programs = builder().programs(&BrickCommand::Move {
            axis: Axis::X,
            position: 3.0,
        });
        assert_eq!(programs[0], "CLOSE ALL\r#1J/\r#3J/\r#4J/\r&4!X3.0");
    }

    #[test]
    fn calibrate_has_three_stages_and_close() {
        let programs = builder().programs(&BrickCommand::Cal);
        assert_eq!(programs.len(), 4);
        assert!(programs[0].starts_with("CLOSE ALL\rOPEN PLC 10\rCLEAR"));
        assert!(programs[0].contains("WHILE (M331=0 OR M431=0)\rWAIT\rENDWHILE"));
        assert!(programs[1].contains("CMD \"#3J=-2121054\""));
        assert!(programs[1].contains("CMD \"#4J=-1218574\""));
        assert!(programs[1].contains("WHILE (M340=0 OR M440=0)"));
        assert!(programs[2].ends_with("CMD \"DISABLE PLC 10\"\rCLOSE\rENABLE PLC 10"));
        assert_eq!(programs[3], CLOSE_ALL);
    }

    #[test]
    fn calibrate_uses_configured_counts() {
        let config = BrickConfig::default().with_home_counts(-100, -200).with_slots(11, 2);
        let programs = MacroBuilder::new(&config).programs(&BrickCommand::Cal);
        assert!(programs[0].contains("OPEN PLC 11"));
        assert!(programs[1].contains("#3J=-100"));
        assert!(programs[1].contains("#4J=-200"));
    }

    #[test]
    fn offset_program_sequence() {
        let programs = builder().programs(&BrickCommand::Off {
            axis: Axis::A,
            offset: 1.5,
        });
        assert_eq!(programs.len(), 3);
        assert_eq!(
            programs[0],
            "CLOSE ALL\r#1J/\r#3J/\r#4J/\rOPEN PROG 1\rCLEAR\rINC\rA1.5\rCLOSE"
        );
        assert_eq!(
            programs[1],
            "OPEN PLC 10\rCLEAR\rADDRESS &3#3\rCMD \"B1R\"\rWHILE (M340=0)\rWAIT\rENDWHILE"
        );
        assert_eq!(programs[2], "CMD \"DISABLE PLC 10\"\rCLOSE\rENABLE PLC 10");
    }

    #[test]
    fn halt_kills_one_motor() {
        let programs = builder().programs(&BrickCommand::Halt { axis: Axis::X });
        assert_eq!(programs, vec!["CLOSE ALL\r#4K\r#4J/", CLOSE_ALL]);
    }

    #[test]
    fn locate_moves_in_axis_order() {
        let programs = builder().programs(&BrickCommand::Loc {
            positions: [1.0, 2.5, -3.0],
        });
        let program = &programs[0];
        let z = program.find("&1!Z1.0").unwrap();
        let a = program.find("&3!A2.5").unwrap();
        let x = program.find("&4!X-3.0").unwrap();
        assert!(z < a && a < x);
        assert!(program.starts_with("CLOSE ALL\r#1J/\r#3J/\r#4J/"));
    }

    #[test]
    fn angle_moves_rotation_axis_only() {
        let programs = builder().programs(&BrickCommand::Angle { angle: 45.0 });
        assert_eq!(programs[0], "CLOSE ALL\r#3J/\r&3!A45.0");
    }

    #[test]
    fn reset_sequence() {
        let programs = builder().programs(&BrickCommand::Reset);
        assert_eq!(
            programs[0],
            "CLOSE ALL\rOPEN PROG 1\rCLEAR\rM6014=0\rDWELL2000\rCMD \"$$$\"\rCLOSE\rB1R"
        );
        assert_eq!(programs[1], CLOSE_ALL);
    }

    #[test]
    fn identical_commands_build_identical_frames() {
        let cmd = BrickCommand::Move {
            axis: Axis::Z,
            position: 12.5,
        };
        let frames = |builder: MacroBuilder| {
            builder
                .programs(&cmd)
                .iter()
                .map(|program| command_frame(program).unwrap())
                .collect::<Vec<_>>()
        };
        let first = frames(builder());
        assert_eq!(first.len(), 2);
        assert_eq!(first, frames(builder()));
    }
}
