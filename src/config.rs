//! Gateway configuration: listener, device endpoints and calibration constants.
//!
//! Uses `heapless::String` for hostnames and credentials, with truncating
//! constructors that respect UTF-8 boundaries. Every hard-coded device
//! constant (homing counts, axis scale factors, voltage divisors) lives here
//! so it can be overridden without touching protocol code.
//!
//! # Example
//!
//! ```rust
//! use feanta_bridge::config::{BrickConfig, Config, ListenerConfig};
//!
//! // Use the deployed defaults
//! let config = Config::default();
//! assert_eq!(config.listener.port, 5676);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_listener(ListenerConfig::default().with_port(6000))
//!     .with_brick(BrickConfig::default().with_host("127.0.0.1"));
//! ```

use std::time::Duration;

use heapless::String as HString;

use crate::commands::Axis;

/// Maximum length for short config strings (hostnames, credentials)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (URLs)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helpers for creating heapless strings
// ============================================================================

fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= N)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete gateway configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// ACC-facing listener
    pub listener: ListenerConfig,
    /// GeoBrick motion controller
    pub brick: BrickConfig,
    /// BeagleBone LNA bias controller
    pub bb: BbConfig,
    /// Power distribution unit
    pub pdu: PduConfig,
}

impl Config {
    /// Set listener configuration
    pub fn with_listener(mut self, listener: ListenerConfig) -> Self {
        self.listener = listener;
        self
    }

    /// Set Brick configuration
    pub fn with_brick(mut self, brick: BrickConfig) -> Self {
        self.brick = brick;
        self
    }

    /// Set BB configuration
    pub fn with_bb(mut self, bb: BbConfig) -> Self {
        self.bb = bb;
        self
    }

    /// Set PDU configuration
    pub fn with_pdu(mut self, pdu: PduConfig) -> Self {
        self.pdu = pdu;
        self
    }

    /// Load configuration from a JSON file. Missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_file(
        path: impl AsRef<std::path::Path>,
    ) -> crate::error::GatewayResult<Self> {
        use crate::error::GatewayError;

        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))
    }
}

// ============================================================================
// Listener Config
// ============================================================================

/// ACC listener configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ListenerConfig {
    /// Interface to bind (empty = all interfaces)
    pub host: ShortString,
    /// Port to listen on
    pub port: u16,
    /// Maximum bytes read per command line
    pub max_command_bytes: usize,
    /// How long to wait for a command line after accepting, in milliseconds
    pub read_timeout_ms: u32,
    /// Pause after a failed accept before trying again, in milliseconds
    pub accept_retry_ms: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: ShortString::new(),
            port: 5676,
            max_command_bytes: 1024,
            read_timeout_ms: 5_000,
            accept_retry_ms: 100,
        }
    }
}

impl ListenerConfig {
    /// Set the bind interface
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-command byte cap
    pub fn with_max_command_bytes(mut self, bytes: usize) -> Self {
        self.max_command_bytes = bytes;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout_ms(mut self, ms: u32) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    /// Set the pause after a failed accept
    pub fn with_accept_retry_ms(mut self, ms: u32) -> Self {
        self.accept_retry_ms = ms;
        self
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.port)
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.read_timeout_ms))
    }

    /// Accept retry pause as a [`Duration`].
    pub fn accept_retry(&self) -> Duration {
        Duration::from_millis(u64::from(self.accept_retry_ms))
    }
}

// ============================================================================
// Brick Config
// ============================================================================

/// Counts-per-physical-unit for each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AxisScale {
    /// Axis 1 (Z), counts per mm
    pub axis1: f64,
    /// Axis 3 (A, rotation), counts per degree
    pub axis3: f64,
    /// Axis 4 (X), counts per mm
    pub axis4: f64,
}

impl Default for AxisScale {
    fn default() -> Self {
        Self {
            axis1: 42.5636 * 96.0 * 32.0,
            axis3: 23181.5208 * 96.0 * 32.0,
            axis4: 3973.477 * 96.0 * 32.0,
        }
    }
}

impl AxisScale {
    /// Scale factor for the given axis.
    pub fn for_axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Z => self.axis1,
            Axis::A => self.axis3,
            Axis::X => self.axis4,
        }
    }
}

/// GeoBrick motion controller configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrickConfig {
    /// Controller hostname or IP
    pub host: ShortString,
    /// Controller port
    pub port: u16,
    /// Connect/read/write timeout in milliseconds
    pub timeout_ms: u32,
    /// Maximum reply size read per exchange
    pub reply_bytes: usize,
    /// PLC program slot used for homing and offset watchers
    pub plc_slot: u8,
    /// Motion program slot used for offsets and reset
    pub prog_slot: u8,
    /// Motor 3 homing offset from the positive limit, in motor counts
    pub motor3_home_counts: i64,
    /// Motor 4 homing offset from the positive limit, in motor counts
    pub motor4_home_counts: i64,
    /// Position scale factors
    pub scale: AxisScale,
}

impl Default for BrickConfig {
    fn default() -> Self {
        Self {
            host: short_string("geobrickanta.solar.pvt"),
            port: 1025,
            timeout_ms: 1_500,
            reply_bytes: 1024,
            plc_slot: 10,
            prog_slot: 1,
            motor3_home_counts: -2_121_054,
            motor4_home_counts: -1_218_574,
            scale: AxisScale::default(),
        }
    }
}

impl BrickConfig {
    /// Set the controller host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the controller port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the exchange timeout
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the program slots
    pub fn with_slots(mut self, plc: u8, prog: u8) -> Self {
        self.plc_slot = plc;
        self.prog_slot = prog;
        self
    }

    /// Set the homing offsets for motors 3 and 4
    pub fn with_home_counts(mut self, motor3: i64, motor4: i64) -> Self {
        self.motor3_home_counts = motor3;
        self.motor4_home_counts = motor4;
        self
    }

    /// Set the axis scale factors
    pub fn with_scale(mut self, scale: AxisScale) -> Self {
        self.scale = scale;
        self
    }

    /// Exchange timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

// ============================================================================
// BB Config
// ============================================================================

/// BeagleBone bias controller configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BbConfig {
    /// Controller hostname or IP
    pub host: ShortString,
    /// Controller port
    pub port: u16,
    /// Connect/read/write timeout in milliseconds
    pub timeout_ms: u32,
    /// Divisor applied to drain voltage set-points
    pub drain_factor: f64,
    /// Divisor applied to gate voltage set-points
    pub gate_factor: f64,
    /// Divisor applied to current readings
    pub current_factor: f64,
}

impl Default for BbConfig {
    fn default() -> Self {
        Self {
            host: short_string("lna14.solar.pvt"),
            port: 50002,
            timeout_ms: 300,
            drain_factor: 0.300,
            gate_factor: 0.388,
            current_factor: -2.0,
        }
    }
}

impl BbConfig {
    /// Set the controller host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the controller port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the exchange timeout
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set drain and gate voltage divisors
    pub fn with_factors(mut self, drain: f64, gate: f64) -> Self {
        self.drain_factor = drain;
        self.gate_factor = gate;
        self
    }

    /// Exchange timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

// ============================================================================
// PDU Config
// ============================================================================

/// Power distribution unit configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PduConfig {
    /// Base URL, without trailing slash
    pub base_url: LongString,
    /// Login username
    pub username: ShortString,
    /// Login password
    pub password: ShortString,
    /// Request timeout in milliseconds
    pub timeout_ms: u32,
    /// Outlet feeding the noise diode
    pub noise_diode_outlet: u8,
}

impl Default for PduConfig {
    fn default() -> Self {
        Self {
            base_url: long_string("http://pduanta.solar.pvt"),
            username: short_string("admin"),
            password: short_string("power"),
            timeout_ms: 3_000,
            noise_diode_outlet: 8,
        }
    }
}

impl PduConfig {
    /// Set the base URL; a trailing slash is removed
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = long_string(url.trim_end_matches('/'));
        self
    }

    /// Set login credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Set the request timeout
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Build an absolute URL from a path beginning with `/`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.listener.port, 5676);
        assert_eq!(config.listener.max_command_bytes, 1024);
        assert_eq!(config.brick.port, 1025);
        assert_eq!(config.bb.port, 50002);
        assert_eq!(config.pdu.noise_diode_outlet, 8);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_listener(ListenerConfig::default().with_port(6000))
            .with_brick(BrickConfig::default().with_host("127.0.0.1").with_port(9000))
            .with_bb(BbConfig::default().with_factors(0.5, 0.25))
            .with_pdu(PduConfig::default().with_auth("ops", "secret"));

        assert_eq!(config.listener.port, 6000);
        assert_eq!(config.brick.host.as_str(), "127.0.0.1");
        assert_eq!(config.brick.port, 9000);
        assert_eq!(config.bb.drain_factor, 0.5);
        assert_eq!(config.bb.gate_factor, 0.25);
        assert_eq!(config.pdu.username.as_str(), "ops");
    }

    // =========================================================================
    // ListenerConfig Tests
    // =========================================================================

    #[test]
    fn bind_address_defaults_to_all_interfaces() {
        assert_eq!(ListenerConfig::default().bind_address(), "0.0.0.0:5676");
    }

    #[test]
    fn bind_address_with_host() {
        let listener = ListenerConfig::default().with_host("127.0.0.1").with_port(0);
        assert_eq!(listener.bind_address(), "127.0.0.1:0");
    }

    #[test]
    fn accept_retry_pause() {
        assert_eq!(
            ListenerConfig::default().accept_retry(),
            Duration::from_millis(100)
        );
        let listener = ListenerConfig::default().with_accept_retry_ms(250);
        assert_eq!(listener.accept_retry(), Duration::from_millis(250));
    }

    // =========================================================================
    // BrickConfig Tests
    // =========================================================================

    #[test]
    fn brick_defaults_match_deployment() {
        let brick = BrickConfig::default();
        assert_eq!(brick.host.as_str(), "geobrickanta.solar.pvt");
        assert_eq!(brick.timeout(), Duration::from_millis(1500));
        assert_eq!(brick.plc_slot, 10);
        assert_eq!(brick.prog_slot, 1);
        assert_eq!(brick.motor3_home_counts, -2121054);
        assert_eq!(brick.motor4_home_counts, -1218574);
    }

    #[test]
    fn axis_scale_lookup() {
        let scale = AxisScale::default();
        assert_eq!(scale.for_axis(Axis::Z), 42.5636 * 3072.0);
        assert_eq!(scale.for_axis(Axis::A), 23181.5208 * 3072.0);
        assert_eq!(scale.for_axis(Axis::X), 3973.477 * 3072.0);
    }

    // =========================================================================
    // BbConfig / PduConfig Tests
    // =========================================================================

    #[test]
    fn bb_defaults() {
        let bb = BbConfig::default();
        assert_eq!(bb.drain_factor, 0.3);
        assert_eq!(bb.gate_factor, 0.388);
        assert_eq!(bb.current_factor, -2.0);
        assert_eq!(bb.timeout(), Duration::from_millis(300));
    }

    #[test]
    fn pdu_url_building() {
        let pdu = PduConfig::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(pdu.url("/login.tgi"), "http://127.0.0.1:8080/login.tgi");
    }

    // =========================================================================
    // String Helper Tests
    // =========================================================================

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn long_string_truncation() {
        let long_input = "b".repeat(200);
        let s = long_string(&long_input);
        assert_eq!(s.len(), MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        let input = "\u{00e9}".repeat(40); // 2 bytes each
        let s = short_string(&input);
        assert!(s.len() <= MAX_SHORT_STRING);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_file_partial_override() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"listener": {{"port": 7000}}, "brick": {{"host": "10.0.0.5"}}}}"#
        )
        .unwrap();

        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.listener.port, 7000);
        assert_eq!(config.listener.max_command_bytes, 1024);
        assert_eq!(config.brick.host.as_str(), "10.0.0.5");
        assert_eq!(config.brick.port, 1025);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_file_missing_is_config_error() {
        let err = Config::from_json_file("/nonexistent/feanta.json").unwrap_err();
        assert!(matches!(err, crate::error::GatewayError::Config(_)));
    }
}
