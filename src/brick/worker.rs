//! Brick worker: command validation, program dispatch and telemetry.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::brick::frame::command_frame;
use crate::brick::macros::MacroBuilder;
use crate::brick::telemetry::Poller;
use crate::commands::BrickCommand;
use crate::config::BrickConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::hal::TcpConnector;
use crate::journal::Journal;
use crate::parsing::reply_text;
use crate::stateframe::Stateframe;
use crate::traits::{Connector, Worker};

/// Worker for the GeoBrick motion controller.
///
/// Every program goes out on its own connection and the reply is read
/// before the next program is sent. A transport failure abandons the
/// remaining programs of that command.
///
/// ```rust
/// use feanta_bridge::brick::BrickWorker;
/// use feanta_bridge::config::BrickConfig;
/// use feanta_bridge::hal::MockConnector;
/// use feanta_bridge::traits::Worker;
///
/// let link = MockConnector::new().with_replies([b"\x06".to_vec(), b"\x06".to_vec()]);
/// let mut brick = BrickWorker::new(link.clone(), BrickConfig::default());
///
/// brick.execute(&["BRICKHALT", "3"]).unwrap();
/// assert_eq!(link.connection_count(), 2);
/// ```
#[derive(Debug)]
pub struct BrickWorker<C: Connector = TcpConnector> {
    connector: C,
    builder: MacroBuilder,
    poller: Poller,
    reply_bytes: usize,
    journal: Journal,
}

impl BrickWorker<TcpConnector> {
    /// Worker talking TCP to the configured controller.
    pub fn from_config(config: BrickConfig) -> Self {
        Self::new(TcpConnector::brick(&config), config)
    }
}

impl<C: Connector> BrickWorker<C> {
    /// Create a worker over an arbitrary connector.
    pub fn new(connector: C, config: BrickConfig) -> Self {
        Self {
            connector,
            builder: MacroBuilder::new(&config),
            poller: Poller::new(&config),
            reply_bytes: config.reply_bytes.max(1),
            journal: Journal::default(),
        }
    }

    /// Access the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Send one frame and read its reply on a fresh connection.
    fn exchange(&self, frame: &Bytes) -> GatewayResult<Vec<u8>> {
        let mut stream = self.connector.connect()?;
        stream.write_all(frame)?;
        let mut reply = vec![0u8; self.reply_bytes];
        let n = stream.read(&mut reply)?;
        reply.truncate(n);
        Ok(reply)
    }

    fn report_failure(&self, err: &GatewayError, abandoned: usize) {
        let reason = match err {
            GatewayError::Resolve { .. } => "Brick hostname could not be resolved.".to_string(),
            other => format!("Unable to send packet to brick: {}.", other),
        };
        self.journal.error(&reason);
        if abandoned > 0 {
            self.journal
                .warn(&format!("Abandoned {} remaining program(s).", abandoned));
        }
    }
}

impl<C: Connector> Worker for BrickWorker<C> {
    fn name(&self) -> &str {
        "brick"
    }

    fn commands(&self) -> &[&'static str] {
        &BrickCommand::NAMES
    }

    fn execute(&mut self, tokens: &[&str]) -> GatewayResult<()> {
        let command = BrickCommand::parse(tokens).map_err(|err| {
            self.journal.warn(&err.to_string());
            err
        })?;

        let programs = self.builder.programs(&command);
        let frames = programs
            .iter()
            .map(|program| command_frame(program))
            .collect::<Result<Vec<_>, _>>()?;

        self.journal.info("Issued the following commands to brick:");
        for program in &programs {
            self.journal.info(&format!("{:?}", program));
        }

        for (sent, frame) in frames.iter().enumerate() {
            match self.exchange(frame) {
                Ok(reply) => self
                    .journal
                    .info(&format!("Reply from brick: {:?}", reply_text(&reply))),
                Err(err) => {
                    self.report_failure(&err, frames.len() - sent - 1);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn stateframe_query(&mut self) -> Option<GatewayResult<Stateframe>> {
        let result = self.poller.poll(&self.connector);
        match &result {
            Ok(frame) if frame.decode_failures > 0 => self.journal.warn(&format!(
                "{} brick register replies failed to decode.",
                frame.decode_failures
            )),
            Ok(_) => {}
            Err(err) => self.report_failure(err, 0),
        }
        Some(result)
    }

    fn set_logger(&mut self, journal: Journal) {
        self.journal = journal;
    }
}
