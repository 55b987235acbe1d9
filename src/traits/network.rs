//! Device transport traits: raw TCP streams and HTTP sessions.
//!
//! Every device exchange opens its own connection, uses it, and lets it drop.
//! These traits are the seam between protocol code and the network, so the
//! protocols can be exercised against the mocks in [`crate::hal::mock`].
//!
//! | Trait | Purpose | Real implementation |
//! |-------|---------|---------------------|
//! | [`Connector`] | Opens a fresh byte stream to a device | [`TcpConnector`](crate::hal::TcpConnector) |
//! | [`WebClient`] | Form posts and GETs in one cookie session | [`HttpAgent`](crate::hal::HttpAgent) |
//!
//! # Scoped connections
//!
//! [`Connector::connect`] hands back an owned stream. Callers keep it in a
//! local binding; the socket closes when the binding leaves scope, including
//! on early return through `?`.
//!
//! ```rust
//! use std::io::{Read, Write};
//! use feanta_bridge::hal::MockConnector;
//! use feanta_bridge::traits::Connector;
//!
//! let link = MockConnector::new().with_reply(b"1\r\x06");
//! {
//!     let mut stream = link.connect().unwrap();
//!     stream.write_all(b"M130").unwrap();
//!     let mut buf = [0u8; 16];
//!     let n = stream.read(&mut buf).unwrap();
//!     assert_eq!(&buf[..n], b"1\r\x06");
//! } // closed here
//! assert_eq!(link.sent(), vec![b"M130".to_vec()]);
//! ```

use std::io::{Read, Write};

use crate::error::GatewayResult;

// ============================================================================
// Byte-stream connector (Brick, BB)
// ============================================================================

/// Opens short-lived byte streams to one device.
///
/// Implementations apply the device's timeout to connect, read and write so
/// a silent device can never block the gateway indefinitely.
pub trait Connector {
    /// Stream type; closed on drop.
    type Stream: Read + Write;

    /// Open a fresh connection.
    fn connect(&self) -> GatewayResult<Self::Stream>;

    /// Human-readable endpoint for log messages.
    fn endpoint(&self) -> String;
}

// ============================================================================
// HTTP session client (PDU)
// ============================================================================

/// Minimal blocking HTTP session.
///
/// One instance corresponds to one logged-in session: cookies set by a
/// response are sent with every later request.
pub trait WebClient {
    /// POST an urlencoded form and return the final URL after redirects.
    fn post_form(&mut self, url: &str, form: &[(&str, &str)]) -> GatewayResult<String>;

    /// GET a URL and return the final URL after redirects.
    fn get(&mut self, url: &str) -> GatewayResult<String>;
}

/// Creates fresh [`WebClient`] sessions.
pub trait WebSessionFactory {
    /// Session type.
    type Client: WebClient;

    /// Start a new, unauthenticated session.
    fn open(&self) -> GatewayResult<Self::Client>;
}
