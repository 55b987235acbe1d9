//! Bias board (BB) worker for the four LNAs.
//!
//! The BB speaks a line protocol over TCP. Each line goes out on its own
//! connection, terminated by `\r\n`, and the board sends nothing back for
//! set commands.
//!
//! | ACC command | Lines sent |
//! |-------------|------------|
//! | `LNAGATEA amp volts` | `set amp N gatea V`, `latch` |
//! | `LNAGATEB amp volts` | `set amp N gateb V`, `latch` |
//! | `LNADRAIN amp volts` | `set amp N drain V`, `latch` |
//! | `LNABIAS amp 0\|1` | `set power N S` |
//!
//! Requested voltages are divided by the terminal's hardware factor before
//! they are sent.
//!
//! # Telemetry
//!
//! `read\r\n` returns 96 bytes: 24 big-endian `f32` values grouped by field,
//! four amplifiers per field. Currents are divided by the current factor.

use std::io::{ErrorKind, Read, Write};

use crate::commands::{BbCommand, BiasTerminal, AMPLIFIER_COUNT};
use crate::config::BbConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::hal::TcpConnector;
use crate::journal::Journal;
use crate::parsing::decimal;
use crate::stateframe::{Reading, Record, Stateframe};
use crate::traits::{Connector, Worker};

/// Telemetry fields in block order. Odd entries are currents.
pub const LNA_FIELDS: [&str; 6] = [
    "DRAINVOLTAGE",
    "DRAINCURRENT",
    "GATEAVOLTAGE",
    "GATEACURRENT",
    "GATEBVOLTAGE",
    "GATEBCURRENT",
];

/// Size of the telemetry block in bytes.
pub const LNA_BLOCK_BYTES: usize = LNA_FIELDS.len() * AMPLIFIER_COUNT * 4;

/// Telemetry request line.
pub const READ_LINE: &str = "read";

/// Decode a telemetry block into one record per amplifier.
///
/// Values missing from a short block are recorded as zero; the second
/// element of the result counts them.
pub fn decode_block(block: &[u8], current_factor: f64) -> (Vec<Record>, usize) {
    let mut records = vec![Record::new(); AMPLIFIER_COUNT];
    let mut missing = 0;

    for (field_idx, field) in LNA_FIELDS.iter().enumerate() {
        let is_current = field_idx % 2 == 1;
        for (amp, record) in records.iter_mut().enumerate() {
            let offset = (field_idx * AMPLIFIER_COUNT + amp) * 4;
            let value = match block.get(offset..offset + 4) {
                Some(raw) => {
                    let raw = f64::from(f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]));
                    if is_current {
                        raw / current_factor
                    } else {
                        raw
                    }
                }
                None => {
                    missing += 1;
                    0.0
                }
            };
            record.insert(field.to_string(), Reading::Float(value));
        }
    }
    (records, missing)
}

/// Worker for the LNA bias board.
///
/// ```rust
/// use feanta_bridge::bb::BbWorker;
/// use feanta_bridge::config::BbConfig;
/// use feanta_bridge::hal::MockConnector;
/// use feanta_bridge::traits::Worker;
///
/// let link = MockConnector::new();
/// let mut bb = BbWorker::new(link.clone(), BbConfig::default());
///
/// bb.execute(&["LNABIAS", "1", "1"]).unwrap();
/// assert_eq!(link.connections(), vec![b"set power 1 1\r\n".to_vec()]);
/// ```
#[derive(Debug)]
pub struct BbWorker<C: Connector = TcpConnector> {
    connector: C,
    config: BbConfig,
    journal: Journal,
}

impl BbWorker<TcpConnector> {
    /// Worker talking TCP to the configured board.
    pub fn from_config(config: BbConfig) -> Self {
        Self::new(TcpConnector::bb(&config), config)
    }
}

impl<C: Connector> BbWorker<C> {
    /// Create a worker over an arbitrary connector.
    pub fn new(connector: C, config: BbConfig) -> Self {
        Self {
            connector,
            config,
            journal: Journal::default(),
        }
    }

    /// Access the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Protocol lines for a validated command.
    pub fn lines(&self, command: &BbCommand) -> Vec<String> {
        match *command {
            BbCommand::SetVoltage {
                terminal,
                amp,
                volts,
            } => {
                let factor = match terminal {
                    BiasTerminal::GateA | BiasTerminal::GateB => self.config.gate_factor,
                    BiasTerminal::Drain => self.config.drain_factor,
                };
                vec![
                    format!(
                        "set amp {} {} {}",
                        amp,
                        terminal.keyword(),
                        decimal(volts / factor)
                    ),
                    "latch".to_string(),
                ]
            }
            BbCommand::Bias { amp, on } => vec![format!("set power {} {}", amp, u8::from(on))],
        }
    }

    fn send_line(&self, line: &str) -> GatewayResult<()> {
        let mut stream = self.connector.connect()?;
        stream.write_all(format!("{}\r\n", line).as_bytes())?;
        Ok(())
    }

    fn read_block(&self) -> GatewayResult<Vec<u8>> {
        let mut stream = self.connector.connect()?;
        stream.write_all(format!("{}\r\n", READ_LINE).as_bytes())?;

        let mut block = Vec::with_capacity(LNA_BLOCK_BYTES);
        let mut buf = [0u8; LNA_BLOCK_BYTES];
        while block.len() < LNA_BLOCK_BYTES {
            match stream.read(&mut buf[..LNA_BLOCK_BYTES - block.len()]) {
                Ok(0) => break,
                Ok(n) => block.extend_from_slice(&buf[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if !block.is_empty()
                        && matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    break
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(block)
    }

    fn report_failure(&self, err: &GatewayError) {
        match err {
            GatewayError::Resolve { .. } => self.journal.error("BB hostname could not be resolved."),
            other => self
                .journal
                .error(&format!("Unable to send command to BB: {}.", other)),
        }
    }
}

impl<C: Connector> Worker for BbWorker<C> {
    fn name(&self) -> &str {
        "bb"
    }

    fn commands(&self) -> &[&'static str] {
        &BbCommand::NAMES
    }

    fn execute(&mut self, tokens: &[&str]) -> GatewayResult<()> {
        let command = BbCommand::parse(tokens).map_err(|err| {
            self.journal.warn(&err.to_string());
            err
        })?;

        for line in self.lines(&command) {
            self.journal
                .info(&format!("The following command was issued: {}", line));
            if let Err(err) = self.send_line(&line) {
                self.report_failure(&err);
                return Err(err);
            }
        }
        Ok(())
    }

    fn stateframe_query(&mut self) -> Option<GatewayResult<Stateframe>> {
        let block = match self.read_block() {
            Ok(block) => block,
            Err(err) => {
                self.report_failure(&err);
                return Some(Err(err));
            }
        };
        let (records, missing) = decode_block(&block, self.config.current_factor);
        if missing > 0 {
            self.journal.warn(&format!(
                "Short BB telemetry block: {} of {} bytes.",
                block.len(),
                LNA_BLOCK_BYTES
            ));
        }

        let mut frame = Stateframe::new();
        frame.insert(
            "LNAS",
            Reading::List(records.into_iter().map(Reading::Record).collect()),
        );
        frame.decode_failures = missing;
        Some(Ok(frame))
    }

    fn set_logger(&mut self, journal: Journal) {
        self.journal = journal;
    }
}
