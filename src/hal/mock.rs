//! Mock transports for testing without hardware.
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockConnector`] | [`Connector`] | Scripted replies, recorded writes, simulated outages |
//! | [`MockWeb`] | [`WebSessionFactory`] | Recorded HTTP requests, configurable login landing page |
//!
//! Both mocks are cheap to clone and share their state between clones, so a
//! test can hand one clone to a worker and inspect the other afterwards.
//!
//! # Example
//!
//! ```rust
//! use feanta_bridge::hal::MockConnector;
//! use feanta_bridge::traits::Connector;
//!
//! let link = MockConnector::new().unresolved();
//! assert!(link.connect().is_err());
//! assert_eq!(link.connection_count(), 0);
//! ```
//!
//! [`Connector`]: crate::traits::Connector
//! [`WebSessionFactory`]: crate::traits::WebSessionFactory

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{GatewayError, GatewayResult};
use crate::traits::{Connector, WebClient, WebSessionFactory};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Byte-stream mock
// ============================================================================

/// Simulated connection failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkFailure {
    /// Hostname does not resolve.
    Unresolved,
    /// Connection refused.
    Refused,
}

#[derive(Debug, Default)]
struct LinkState {
    replies: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    connections: Vec<Vec<u8>>,
    failure: Option<LinkFailure>,
    accept_limit: Option<usize>,
}

/// Mock device connector.
///
/// Every [`connect`](Connector::connect) opens a new [`MockStream`]. Reads
/// pop scripted replies in order; when the script runs dry a read fails with
/// [`io::ErrorKind::TimedOut`], like a silent device. Writes are recorded
/// per call and per connection.
#[derive(Clone, Debug, Default)]
pub struct MockConnector {
    state: Arc<Mutex<LinkState>>,
}

impl MockConnector {
    /// Creates a connector with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply.
    pub fn with_reply(self, reply: impl Into<Vec<u8>>) -> Self {
        self.push_reply(reply);
        self
    }

    /// Queue several replies.
    pub fn with_replies<I, R>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<u8>>,
    {
        for reply in replies {
            self.push_reply(reply);
        }
        self
    }

    /// Simulate a hostname that does not resolve.
    pub fn unresolved(self) -> Self {
        lock(&self.state).failure = Some(LinkFailure::Unresolved);
        self
    }

    /// Simulate a device that refuses every connection.
    pub fn refusing(self) -> Self {
        lock(&self.state).failure = Some(LinkFailure::Refused);
        self
    }

    /// Accept `n` connections, then refuse the rest.
    pub fn refuse_after(self, n: usize) -> Self {
        lock(&self.state).accept_limit = Some(n);
        self
    }

    /// Queue one reply on a shared handle.
    pub fn push_reply(&self, reply: impl Into<Vec<u8>>) {
        lock(&self.state).replies.push_back(reply.into());
    }

    /// Every `write` call, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    /// Bytes written on each connection, one entry per connection.
    pub fn connections(&self) -> Vec<Vec<u8>> {
        lock(&self.state).connections.clone()
    }

    /// Number of connections opened so far.
    pub fn connection_count(&self) -> usize {
        lock(&self.state).connections.len()
    }

    /// Replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        lock(&self.state).replies.len()
    }
}

impl Connector for MockConnector {
    type Stream = MockStream;

    fn connect(&self) -> GatewayResult<MockStream> {
        let mut state = lock(&self.state);
        match state.failure {
            Some(LinkFailure::Unresolved) => {
                return Err(GatewayError::Resolve {
                    host: self.endpoint(),
                })
            }
            Some(LinkFailure::Refused) => {
                return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into())
            }
            None => {}
        }
        if state
            .accept_limit
            .is_some_and(|limit| state.connections.len() >= limit)
        {
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        }
        state.connections.push(Vec::new());
        Ok(MockStream {
            state: Arc::clone(&self.state),
            index: state.connections.len() - 1,
        })
    }

    fn endpoint(&self) -> String {
        "mock".to_string()
    }
}

/// Stream handed out by [`MockConnector`].
#[derive(Debug)]
pub struct MockStream {
    state: Arc<Mutex<LinkState>>,
    index: usize,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = lock(&self.state);
        let Some(mut reply) = state.replies.pop_front() else {
            return Err(io::ErrorKind::TimedOut.into());
        };
        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        if n < reply.len() {
            state.replies.push_front(reply.split_off(n));
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = lock(&self.state);
        state.writes.push(buf.to_vec());
        if let Some(conn) = state.connections.get_mut(self.index) {
            conn.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// HTTP mock
// ============================================================================

/// HTTP method recorded by [`MockWeb`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
}

/// One request recorded by [`MockWeb`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Session the request was made in (0-based).
    pub session: usize,
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Form fields for POST requests.
    pub form: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct WebState {
    requests: Vec<RecordedRequest>,
    sessions: usize,
    landing: Option<String>,
    unreachable: bool,
}

/// Mock HTTP session factory.
///
/// By default every request succeeds and reports its own URL as the final
/// URL. [`redirect_index_to`](Self::redirect_index_to) makes the post-login
/// index page land elsewhere, which is how a rejected login looks.
#[derive(Clone, Debug, Default)]
pub struct MockWeb {
    state: Arc<Mutex<WebState>>,
}

impl MockWeb {
    /// Creates a mock that accepts every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make requests for `/index.htm` end up at `url`.
    pub fn redirect_index_to(self, url: &str) -> Self {
        lock(&self.state).landing = Some(url.to_string());
        self
    }

    /// Make every request fail as if the host were down.
    pub fn unreachable(self) -> Self {
        lock(&self.state).unreachable = true;
        self
    }

    /// All recorded requests, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// URLs of all recorded requests, in order.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.state)
            .requests
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    /// Number of sessions opened.
    pub fn session_count(&self) -> usize {
        lock(&self.state).sessions
    }
}

impl WebSessionFactory for MockWeb {
    type Client = MockWebSession;

    fn open(&self) -> GatewayResult<MockWebSession> {
        let mut state = lock(&self.state);
        state.sessions += 1;
        Ok(MockWebSession {
            state: Arc::clone(&self.state),
            session: state.sessions - 1,
        })
    }
}

/// Session handed out by [`MockWeb`].
#[derive(Debug)]
pub struct MockWebSession {
    state: Arc<Mutex<WebState>>,
    session: usize,
}

impl MockWebSession {
    fn record(
        &mut self,
        method: HttpMethod,
        url: &str,
        form: &[(&str, &str)],
    ) -> GatewayResult<String> {
        let mut state = lock(&self.state);
        if state.unreachable {
            return Err(GatewayError::Http(format!("{}: connection refused", url)));
        }
        state.requests.push(RecordedRequest {
            session: self.session,
            method,
            url: url.to_string(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        match &state.landing {
            Some(landing) if url.ends_with("/index.htm") => Ok(landing.clone()),
            _ => Ok(url.to_string()),
        }
    }
}

impl WebClient for MockWebSession {
    fn post_form(&mut self, url: &str, form: &[(&str, &str)]) -> GatewayResult<String> {
        self.record(HttpMethod::Post, url, form)
    }

    fn get(&mut self, url: &str) -> GatewayResult<String> {
        self.record(HttpMethod::Get, url, &[])
    }
}
