//! Blocking TCP connector for the Brick and BB controllers.
//!
//! Each [`connect`](Connector::connect) resolves the hostname afresh,
//! connects with the configured timeout and applies the same timeout to
//! reads and writes. The returned [`TcpStream`] closes when dropped.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::{BbConfig, BrickConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::traits::Connector;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Opens one TCP connection per exchange.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnector {
    /// Create a connector for `host:port`.
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: timeout.max(MIN_TIMEOUT),
        }
    }

    /// Connector for the motion controller.
    pub fn brick(config: &BrickConfig) -> Self {
        Self::new(config.host.as_str(), config.port, config.timeout())
    }

    /// Connector for the bias controller.
    pub fn bb(config: &BbConfig) -> Self {
        Self::new(config.host.as_str(), config.port, config.timeout())
    }

    fn resolve(&self) -> GatewayResult<Vec<SocketAddr>> {
        let unresolved = || GatewayError::Resolve {
            host: self.host.clone(),
        };
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| unresolved())?
            .collect();
        if addrs.is_empty() {
            return Err(unresolved());
        }
        Ok(addrs)
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> GatewayResult<TcpStream> {
        let mut last_error = None;
        for addr in self.resolve()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.map_or_else(
            || GatewayError::Resolve {
                host: self.host.clone(),
            },
            GatewayError::Io,
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
