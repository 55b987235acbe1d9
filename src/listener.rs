//! TCP command listener for the ACC.
//!
//! Connections are handled one at a time. For each connection the listener
//! reads a single command line, echoes the command name back to the client
//! right away, then hands the line to the [`WorkerRegistry`]. The echo
//! acknowledges receipt; it says nothing about whether the command worked.
//!
//! No failure inside a connection stops the loop: read errors, unknown
//! commands and device errors are logged and the next connection is
//! accepted.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crate::config::ListenerConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::journal::{Journal, LOG_TARGET};
use crate::parsing::tokenize;
use crate::registry::WorkerRegistry;

/// Read one command line: a single read of at most `limit` bytes.
///
/// Whatever arrives first is the command; a trailing newline is not
/// required. Returns an empty string if the peer closed without sending.
pub fn read_command<R: Read>(stream: &mut R, limit: usize) -> io::Result<String> {
    let mut buf = vec![0u8; limit.max(1)];
    let n = loop {
        match stream.read(&mut buf) {
            Ok(n) => break n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    };
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

/// Serial TCP command server.
#[derive(Debug)]
pub struct Listener {
    socket: TcpListener,
    registry: WorkerRegistry,
    config: ListenerConfig,
    journal: Journal,
}

impl Listener {
    /// Bind the configured address. The registry's journal is used for
    /// listener log messages.
    pub fn bind(config: &ListenerConfig, registry: WorkerRegistry) -> GatewayResult<Self> {
        let journal = registry.journal().clone();
        let address = config.bind_address();
        journal.info(&format!("Attempting to set up listener on {}.", address));
        let socket = TcpListener::bind(&address).map_err(|err| {
            journal.error(&format!("Unable to bind {}: {}.", address, err));
            GatewayError::from(err)
        })?;
        journal.info(&format!(
            "Listening for ACC commands on {}.",
            socket.local_addr()?
        ));
        Ok(Self {
            socket,
            registry,
            config: config.clone(),
            journal,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> GatewayResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Access the registry.
    pub fn registry_mut(&mut self) -> &mut WorkerRegistry {
        &mut self.registry
    }

    /// Accept and handle connections forever.
    ///
    /// A failed accept is followed by the configured retry pause.
    pub fn serve(&mut self) -> ! {
        loop {
            if let Some(pause) = self.serve_step() {
                thread::sleep(pause);
            }
        }
    }

    /// Accept one connection and handle its command.
    ///
    /// Everything worth reporting has been logged by the time this returns;
    /// the result only tells the caller how the command ended.
    pub fn serve_one(&mut self) -> GatewayResult<()> {
        let stream = self.accept()?;
        self.handle(stream)
    }

    /// One pass of the serve loop. Returns the pause to take before the next
    /// pass, which is only needed when accept itself failed.
    fn serve_step(&mut self) -> Option<Duration> {
        match self.accept() {
            Ok(stream) => {
                if let Err(err) = self.handle(stream) {
                    log::debug!(target: LOG_TARGET, "connection finished with error: {}", err);
                }
                None
            }
            Err(_) => Some(self.config.accept_retry()),
        }
    }

    fn accept(&mut self) -> GatewayResult<TcpStream> {
        let (stream, peer) = self.socket.accept().map_err(|err| {
            self.journal
                .error(&format!("Unable to accept connection: {}.", err));
            GatewayError::from(err)
        })?;
        self.journal.info(&format!("Connection from {}", peer));
        Ok(stream)
    }

    fn handle(&mut self, mut stream: TcpStream) -> GatewayResult<()> {
        let line = stream
            .set_read_timeout(Some(self.config.read_timeout()))
            .and_then(|()| read_command(&mut stream, self.config.max_command_bytes))
            .map_err(|err| {
                self.journal
                    .error(&format!("Unable to read command from connection: {}.", err));
                GatewayError::from(err)
            })?;

        let tokens = tokenize(&line);
        if let Some(name) = tokens.first() {
            self.journal
                .info(&format!("Command issued from connection: {}", line.trim()));
            if let Err(err) = stream.write_all(name.as_bytes()) {
                self.journal
                    .warn(&format!("Unable to echo {} to client: {}.", name, err));
            }
        }
        drop(stream);

        self.registry.dispatch(&tokens)
    }
}
