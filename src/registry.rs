//! Command routing from ACC command names to device workers.
//!
//! Workers are registered once at startup. Registration injects the
//! registry's [`Journal`] into the worker and claims every name in
//! [`Worker::commands`]; a name already claimed by another worker is
//! rejected rather than silently shadowed.
//!
//! ```rust
//! use feanta_bridge::bb::BbWorker;
//! use feanta_bridge::config::BbConfig;
//! use feanta_bridge::hal::MockConnector;
//! use feanta_bridge::{Journal, WorkerRegistry};
//!
//! let mut registry = WorkerRegistry::new(Journal::silent());
//! registry
//!     .register(Box::new(BbWorker::new(MockConnector::new(), BbConfig::default())))
//!     .unwrap();
//!
//! assert_eq!(registry.route("LNABIAS"), Some("bb"));
//! assert_eq!(registry.route("BRICKCAL"), None);
//! ```

use std::collections::{HashMap, HashSet};

use crate::error::{GatewayError, GatewayResult};
use crate::journal::Journal;
use crate::stateframe::Stateframe;
use crate::traits::Worker;

/// Maps command names to the worker that owns them.
pub struct WorkerRegistry {
    workers: Vec<Box<dyn Worker>>,
    routes: HashMap<&'static str, usize>,
    journal: Journal,
}

impl WorkerRegistry {
    /// Empty registry logging to `journal`.
    pub fn new(journal: Journal) -> Self {
        Self {
            workers: Vec::new(),
            routes: HashMap::new(),
            journal,
        }
    }

    /// The registry's journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Register a worker and claim its command names.
    ///
    /// Fails without side effects if any name is already claimed, or if
    /// the worker lists a name twice.
    pub fn register(&mut self, mut worker: Box<dyn Worker>) -> GatewayResult<()> {
        let mut claimed = HashSet::new();
        for &command in worker.commands() {
            let existing = match self.routes.get(command) {
                Some(&idx) => Some(self.workers[idx].name().to_string()),
                None if !claimed.insert(command) => Some(worker.name().to_string()),
                None => None,
            };
            if let Some(existing) = existing {
                return Err(GatewayError::DuplicateCommand {
                    command: command.to_string(),
                    existing,
                    incoming: worker.name().to_string(),
                });
            }
        }

        worker.set_logger(self.journal.clone());
        let idx = self.workers.len();
        for command in claimed {
            self.routes.insert(command, idx);
        }
        self.workers.push(worker);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_worker(mut self, worker: impl Worker + 'static) -> GatewayResult<Self> {
        self.register(Box::new(worker))?;
        Ok(self)
    }

    /// Name of the worker owning `command`.
    pub fn route(&self, command: &str) -> Option<&str> {
        self.routes
            .get(command)
            .map(|&idx| self.workers[idx].name())
    }

    /// Every registered command name, sorted.
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.routes.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether no worker is registered.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Route a tokenized command line to its worker.
    ///
    /// Empty and unknown commands are logged here. Worker failures are
    /// logged by the worker and passed through.
    pub fn dispatch(&mut self, tokens: &[&str]) -> GatewayResult<()> {
        let Some(&command) = tokens.first() else {
            self.journal.warn("Empty command received.");
            return Err(GatewayError::EmptyCommand);
        };
        let Some(&idx) = self.routes.get(command) else {
            let err = GatewayError::UnknownCommand(command.to_string());
            self.journal.warn(&err.to_string());
            return Err(err);
        };
        self.workers[idx].execute(tokens)
    }

    /// Poll every worker that supports telemetry and merge the results in
    /// registration order. A failing worker is logged and skipped.
    pub fn stateframe(&mut self) -> Stateframe {
        let mut merged = Stateframe::new();
        for worker in &mut self.workers {
            match worker.stateframe_query() {
                Some(Ok(frame)) => merged.merge(frame),
                Some(Err(err)) => self.journal.error(&format!(
                    "Stateframe query for {} failed: {}.",
                    worker.name(),
                    err
                )),
                None => {}
            }
        }
        merged
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field(
                "workers",
                &self.workers.iter().map(|w| w.name()).collect::<Vec<_>>(),
            )
            .field("commands", &self.command_names())
            .finish()
    }
}
