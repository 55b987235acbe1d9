//! Brick register polling.
//!
//! Each axis is polled over one connection: for every register the poller
//! sends a `M{axis}{code}` query framed like any other program, reads one
//! reply and decodes it according to the register's kind.
//!
//! | Kind | Codes | Decoded as |
//! |------|-------|------------|
//! | [`RegisterKind::Status`] | 30–32, 40–42, 47, 48 | integer flag |
//! | [`RegisterKind::Position`] | 61–63 | counts divided by the axis scale |
//! | [`RegisterKind::Analog`] | 75–78 | raw float |
//!
//! A reply that does not decode is recorded as zero and counted in
//! [`Stateframe::decode_failures`].

use std::io::{Read, Write};

use crate::brick::frame::command_frame;
use crate::commands::Axis;
use crate::config::{AxisScale, BrickConfig};
use crate::error::GatewayResult;
use crate::parsing::reply_text;
use crate::stateframe::{Reading, Record, Stateframe};
use crate::traits::Connector;

/// How a register reply is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterKind {
    /// Integer status flag.
    Status,
    /// Motor position in counts, scaled to user units.
    Position,
    /// Current or integrator value.
    Analog,
}

/// One polled motor register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Register {
    /// Two-digit suffix of the `M` variable.
    pub code: &'static str,
    /// Key in the axis record.
    pub name: &'static str,
    /// Decoding rule.
    pub kind: RegisterKind,
}

const fn register(code: &'static str, name: &'static str, kind: RegisterKind) -> Register {
    Register { code, name, kind }
}

/// Registers polled for every axis, in poll order.
pub const REGISTERS: [Register; 15] = [
    register("30", "STOPPED", RegisterKind::Status),
    register("31", "POSLIMIT", RegisterKind::Status),
    register("32", "NEGLIMIT", RegisterKind::Status),
    register("40", "INPOS", RegisterKind::Status),
    register("41", "WARNFOLLERR", RegisterKind::Status),
    register("42", "FATALFOLLERR", RegisterKind::Status),
    register("47", "I2TFAULT", RegisterKind::Status),
    register("48", "PHASEERRFAULT", RegisterKind::Status),
    register("61", "ACTUALMPOS", RegisterKind::Position),
    register("62", "COMMPOS", RegisterKind::Position),
    register("63", "TARGETPOS", RegisterKind::Position),
    register("75", "QUADCURRENT", RegisterKind::Analog),
    register("76", "DIRECTCURRENT", RegisterKind::Analog),
    register("77", "QUADINTEG", RegisterKind::Analog),
    register("78", "DIRECTINTEG", RegisterKind::Analog),
];

impl Register {
    /// Query text for this register on `axis`, e.g. `M161`.
    pub fn query(&self, axis: Axis) -> String {
        format!("M{}{}", axis.number(), self.code)
    }

    /// Decode reply text. Returns `None` when the text is not a number of
    /// the expected kind.
    pub fn decode(&self, text: &str, scale: f64) -> Option<Reading> {
        match self.kind {
            RegisterKind::Status => text.parse::<i64>().ok().map(Reading::Int),
            RegisterKind::Position => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|counts| Reading::Float(counts / scale)),
            RegisterKind::Analog => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Reading::Float),
        }
    }

    fn zero(&self) -> Reading {
        match self.kind {
            RegisterKind::Status => Reading::Int(0),
            RegisterKind::Position | RegisterKind::Analog => Reading::Float(0.0),
        }
    }
}

/// Reads every register of every axis.
#[derive(Clone, Debug)]
pub struct Poller {
    scale: AxisScale,
    reply_bytes: usize,
}

impl Poller {
    /// Poller using the scale table and reply size from `config`.
    pub fn new(config: &BrickConfig) -> Self {
        Self {
            scale: config.scale,
            reply_bytes: config.reply_bytes.max(1),
        }
    }

    /// Poll all axes. Transport failures abort the poll.
    pub fn poll<C: Connector>(&self, connector: &C) -> GatewayResult<Stateframe> {
        let mut frame = Stateframe::new();
        for axis in Axis::ALL {
            let (record, failures) = self.poll_axis(connector, axis)?;
            frame.insert(axis.label(), Reading::Record(record));
            frame.decode_failures += failures;
        }
        Ok(frame)
    }

    /// Poll one axis over a single connection. Returns the record and the
    /// number of registers that failed to decode.
    pub fn poll_axis<C: Connector>(
        &self,
        connector: &C,
        axis: Axis,
    ) -> GatewayResult<(Record, usize)> {
        let scale = self.scale.for_axis(axis);
        let mut stream = connector.connect()?;
        let mut buf = vec![0u8; self.reply_bytes];
        let mut record = Record::new();
        let mut failures = 0;

        for register in &REGISTERS {
            let query = command_frame(&register.query(axis))?;
            stream.write_all(&query)?;
            let n = stream.read(&mut buf)?;
            let text = reply_text(&buf[..n]);
            let reading = match register.decode(&text, scale) {
                Some(reading) => reading,
                None => {
                    failures += 1;
                    register.zero()
                }
            };
            record.insert(register.name.to_string(), reading);
        }
        Ok((record, failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockConnector;

    fn reply(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.extend_from_slice(b"\r\x06");
        bytes
    }

    fn axis_replies(position_counts: &str) -> Vec<Vec<u8>> {
        REGISTERS
            .iter()
            .map(|r| match r.kind {
                RegisterKind::Status => reply("1"),
                RegisterKind::Position => reply(position_counts),
                RegisterKind::Analog => reply("0.25"),
            })
            .collect()
    }

    // =========================================================================
    // Register table
    // =========================================================================

    #[test]
    fn register_queries() {
        assert_eq!(REGISTERS[0].query(Axis::Z), "M130");
        assert_eq!(REGISTERS[8].query(Axis::A), "M361");
        assert_eq!(REGISTERS[14].query(Axis::X), "M478");
    }

    #[test]
    fn register_names_unique() {
        let mut names: Vec<_> = REGISTERS.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REGISTERS.len());
    }

    #[test]
    fn decode_by_kind() {
        let status = REGISTERS[0];
        let position = REGISTERS[8];
        let analog = REGISTERS[11];
        assert_eq!(status.decode("1", 2.0), Some(Reading::Int(1)));
        assert_eq!(status.decode("1.5", 2.0), None);
        assert_eq!(position.decode("100", 4.0), Some(Reading::Float(25.0)));
        assert_eq!(analog.decode("-0.5", 4.0), Some(Reading::Float(-0.5)));
        assert_eq!(analog.decode("", 4.0), None);
        assert_eq!(analog.decode("nan", 4.0), None);
    }

    // =========================================================================
    // Polling
    // =========================================================================

    #[test]
    fn poll_axis_divides_positions_by_scale() {
        let config = BrickConfig::default().with_scale(AxisScale {
            axis1: 2.0,
            axis3: 4.0,
            axis4: 8.0,
        });
        let link = MockConnector::new().with_replies(axis_replies("80"));
        let (record, failures) = Poller::new(&config).poll_axis(&link, Axis::A).unwrap();

        assert_eq!(failures, 0);
        assert_eq!(record.len(), REGISTERS.len());
        assert_eq!(record["STOPPED"], Reading::Int(1));
        assert_eq!(record["ACTUALMPOS"], Reading::Float(20.0));
        assert_eq!(record["QUADCURRENT"], Reading::Float(0.25));
        assert_eq!(link.connection_count(), 1);
    }

    #[test]
    fn poll_axis_sends_framed_queries() {
        let link = MockConnector::new().with_replies(axis_replies("0"));
        Poller::new(&BrickConfig::default())
            .poll_axis(&link, Axis::X)
            .unwrap();

        let sent = link.sent();
        assert_eq!(sent.len(), REGISTERS.len());
        assert_eq!(&sent[0][..], &command_frame("M430").unwrap()[..]);
    }

    #[test]
    fn undecodable_reply_defaults_to_zero() {
        let mut replies = axis_replies("10");
        replies[0] = reply("garbage");
        replies[9] = reply("");
        let link = MockConnector::new().with_replies(replies);
        let (record, failures) = Poller::new(&BrickConfig::default())
            .poll_axis(&link, Axis::Z)
            .unwrap();

        assert_eq!(failures, 2);
        assert_eq!(record["STOPPED"], Reading::Int(0));
        assert_eq!(record["COMMPOS"], Reading::Float(0.0));
    }

    #[test]
    fn poll_keys_every_axis() {
        let replies: Vec<_> = Axis::ALL.iter().flat_map(|_| axis_replies("0")).collect();
        let link = MockConnector::new().with_replies(replies);
        let frame = Poller::new(&BrickConfig::default()).poll(&link).unwrap();

        for key in ["AXIS1", "AXIS3", "AXIS4"] {
            assert!(frame.get(key).and_then(Reading::as_record).is_some());
        }
        assert_eq!(frame.decode_failures, 0);
        assert_eq!(link.connection_count(), 3);
    }

    #[test]
    fn silent_device_aborts_poll() {
        let link = MockConnector::new().with_replies(axis_replies("0").into_iter().take(3));
        assert!(Poller::new(&BrickConfig::default()).poll(&link).is_err());
    }
}
