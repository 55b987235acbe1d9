//! Transport implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `tcp`: [`TcpConnector`], one blocking socket per exchange (Brick, BB)
//! - `http`: [`HttpSessions`] / [`HttpAgent`], cookie-backed HTTP sessions (PDU)
//! - `mock`: scripted test doubles for desktop development

pub mod http;
pub mod mock;
pub mod tcp;

pub use http::*;
pub use mock::*;
pub use tcp::*;
