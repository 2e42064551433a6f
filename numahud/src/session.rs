//! The loop state shared by the TUI and headless runs
//!
//! A [`Session`] turns keys into commands, runs them through the dispatcher,
//! and reloads the current view from its [`ViewSource`] when asked to.

use anyhow::Result;
use log::{debug, info, warn};

use crate::command::{command_for_key, Command, Key};
use crate::counters::{CounterControl, Reading};
use crate::domain::{SamplingMode, TransitionError};
use crate::export::TransitionJournal;
use crate::transition::{Coordinator, Dispatcher, Outcome};
use crate::views::{ViewSource, ViewStack};

pub struct Session<C: CounterControl> {
    views: ViewStack,
    dispatcher: Dispatcher<C>,
    source: Box<dyn ViewSource>,
    readings: Vec<Reading>,
    status: Option<String>,
    should_quit: bool,
}

impl<C: CounterControl> Session<C> {
    pub fn new(counters: C, source: Box<dyn ViewSource>) -> Self {
        Self {
            views: ViewStack::new(),
            dispatcher: Dispatcher::new(Coordinator::new(counters)),
            source,
            readings: Vec::new(),
            status: None,
            should_quit: false,
        }
    }

    /// Start profiling for the overview and load its rows
    ///
    /// # Errors
    /// Returns an error if the counters cannot be started or the process list
    /// cannot be read
    pub fn start(&mut self) -> Result<()> {
        self.dispatcher.dispatch(&mut self.views, Command::Home)?;
        self.refresh_current()
    }

    pub fn views(&self) -> &ViewStack {
        &self.views
    }

    pub fn mode(&self) -> SamplingMode {
        self.dispatcher.coordinator().mode()
    }

    pub fn counters(&self) -> &C {
        self.dispatcher.coordinator().counters()
    }

    pub fn journal(&self) -> &TransitionJournal {
        self.dispatcher.journal()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Message for the status bar, from the last failed command
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Handle one key; scrolling stays in the view, everything else dispatches
    pub fn press(&mut self, key: Key) {
        match key {
            Key::Up => self.views.current_mut().scroll_up(),
            Key::Down => self.views.current_mut().scroll_down(),
            _ => match command_for_key(self.views.current().kind(), key) {
                Some(cmd) => {
                    if let Err(err) = self.execute(cmd) {
                        // Already in the status line
                        debug!("{} not applied: {err}", cmd.name());
                    }
                }
                None => debug!("{key:?} is not bound in the {} view", self.views.current().kind().name()),
            },
        }
    }

    /// Dispatch a command and report failures in the status line
    ///
    /// # Errors
    /// The transition error, after it has been turned into a status message
    pub fn execute(&mut self, cmd: Command) -> Result<Outcome, TransitionError> {
        if cmd == Command::Quit {
            self.should_quit = true;
        }

        match self.dispatcher.dispatch(&mut self.views, cmd) {
            Ok(outcome) => {
                self.status = None;
                Ok(outcome)
            }
            Err(err) => {
                if err.is_benign() {
                    info!("{}: {err}", cmd.name());
                } else {
                    warn!("{} failed: {err}", cmd.name());
                }
                self.status = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Reload the current view and take a fresh set of counter readings
    ///
    /// # Errors
    /// Returns an error if the view's rows cannot be read
    pub fn refresh_current(&mut self) -> Result<()> {
        self.readings = self.dispatcher.coordinator_mut().counters_mut().readings();
        self.views.current_mut().reload(self.source.as_ref())
    }

    /// Periodic refresh; a failed reload is shown but does not end the session
    pub fn tick(&mut self) {
        if let Err(err) = self.refresh_current() {
            warn!("Refresh failed: {err:#}");
            self.status = Some(format!("Refresh failed: {err}"));
        }
    }

    /// Stop every counter; the session is not usable afterwards
    pub fn shutdown(&mut self) {
        self.dispatcher.coordinator_mut().shutdown();
    }
}
