//! Power distribution unit (PDU) worker.
//!
//! The PDU is driven through its web interface. Each command runs one
//! session: log in with a form post, confirm the session landed on the
//! index page, follow the outlet link, then log out.
//!
//! | ACC command | Link followed |
//! |-------------|---------------|
//! | `OUTLET n 0\|1` | `/outlet?n=OFF\|ON` |
//! | `ND-ON` | `/outlet?8=ON` |
//! | `ND-OFF` | `/outlet?8=OFF` |
//!
//! The noise diode sits on the outlet named by
//! [`PduConfig::noise_diode_outlet`].

use crate::commands::PduCommand;
use crate::config::PduConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::hal::HttpSessions;
use crate::journal::Journal;
use crate::traits::{WebClient, WebSessionFactory, Worker};

const LOGIN_PATH: &str = "/login.tgi";
const INDEX_PATH: &str = "/index.htm";
const LOGOUT_PATH: &str = "/logout";

/// Worker for the web-controlled PDU.
///
/// ```rust
/// use feanta_bridge::config::PduConfig;
/// use feanta_bridge::hal::MockWeb;
/// use feanta_bridge::pdu::PduWorker;
/// use feanta_bridge::traits::Worker;
///
/// let web = MockWeb::new();
/// let config = PduConfig::default().with_base_url("http://pdu.test");
/// let mut pdu = PduWorker::new(web.clone(), config);
///
/// pdu.execute(&["OUTLET", "3", "1"]).unwrap();
/// assert!(web.urls().contains(&"http://pdu.test/outlet?3=ON".to_string()));
/// ```
#[derive(Debug)]
pub struct PduWorker<W: WebSessionFactory = HttpSessions> {
    sessions: W,
    config: PduConfig,
    journal: Journal,
}

impl PduWorker<HttpSessions> {
    /// Worker using real HTTP sessions.
    pub fn from_config(config: PduConfig) -> Self {
        Self::new(HttpSessions::pdu(&config), config)
    }
}

impl<W: WebSessionFactory> PduWorker<W> {
    /// Create a worker over an arbitrary session factory.
    pub fn new(sessions: W, config: PduConfig) -> Self {
        Self {
            sessions,
            config,
            journal: Journal::default(),
        }
    }

    /// Outlet link for a validated command.
    pub fn outlet_url(&self, command: &PduCommand) -> String {
        let (outlet, on) = match *command {
            PduCommand::Outlet { outlet, on } => (outlet, on),
            PduCommand::NoiseDiode { on } => (self.config.noise_diode_outlet, on),
        };
        let state = if on { "ON" } else { "OFF" };
        self.config.url(&format!("/outlet?{}={}", outlet, state))
    }

    fn login(&self, session: &mut W::Client) -> GatewayResult<()> {
        session.post_form(
            &self.config.url(LOGIN_PATH),
            &[
                ("Username", self.config.username.as_str()),
                ("Password", self.config.password.as_str()),
            ],
        )?;
        let index = self.config.url(INDEX_PATH);
        let landing = session.get(&index)?;
        if landing != index {
            return Err(GatewayError::LoginRejected { landing });
        }
        Ok(())
    }

    fn run(&self, url: &str) -> GatewayResult<()> {
        let mut session = self.sessions.open()?;
        if let Err(err) = self.login(&mut session) {
            self.journal.error("Unable to login to PDU.");
            return Err(err);
        }
        self.journal.info("Successfully logged into PDU.");

        let toggled = session.get(url);
        match &toggled {
            Ok(_) => self
                .journal
                .info(&format!("The following link was followed for the PDU: {}", url)),
            Err(err) => self
                .journal
                .error(&format!("Unable to follow PDU link {}: {}.", url, err)),
        }

        match session.get(&self.config.url(LOGOUT_PATH)) {
            Ok(_) => self.journal.info("Successfully logged out."),
            Err(err) => self
                .journal
                .warn(&format!("Unable to log out of PDU: {}.", err)),
        }
        toggled.map(|_| ())
    }
}

impl<W: WebSessionFactory> Worker for PduWorker<W> {
    fn name(&self) -> &str {
        "pdu"
    }

    fn commands(&self) -> &[&'static str] {
        &PduCommand::NAMES
    }

    fn execute(&mut self, tokens: &[&str]) -> GatewayResult<()> {
        let command = PduCommand::parse(tokens).map_err(|err| {
            self.journal.warn(&err.to_string());
            err
        })?;
        let url = self.outlet_url(&command);
        self.run(&url)
    }

    fn set_logger(&mut self, journal: Journal) {
        self.journal = journal;
    }
}
