use super::Labels;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Hard upper bound on voting rounds, whatever the config says.
pub const SAFETY_CEILING: u32 = 50;

/// Fixed delays and timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Pause after triggering login, before opening the vote page.
    pub post_login_ms: u64,

    /// Pause after a save, before checking where the session landed.
    pub settle_ms: u64,

    /// How long to wait for the navigation a save may trigger.
    pub navigation_timeout_ms: u64,

    /// Best-effort network idle wait after each `goto`.
    pub network_idle_timeout_ms: u64,

    /// Pause before the browser is released.
    pub close_delay_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            post_login_ms: 2000,
            settle_ms: 2000,
            navigation_timeout_ms: 30_000,
            network_idle_timeout_ms: 10_000,
            close_delay_ms: 0,
        }
    }
}

impl Timings {
    /// No pauses at all. Useful against in-memory pages.
    pub fn immediate() -> Self {
        Self {
            post_login_ms: 0,
            settle_ms: 0,
            navigation_timeout_ms: 0,
            network_idle_timeout_ms: 0,
            close_delay_ms: 0,
        }
    }
}

/// Input to one automation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Credential typed into the login form, exactly as given.
    pub identifier: String,

    /// Preferred zero-based option in every group.
    pub choice_index: usize,

    pub login_url: Url,
    pub vote_url: Url,

    /// Voting rounds allowed for this run (capped by [`SAFETY_CEILING`]).
    pub max_iterations: u32,

    pub labels: Labels,
    pub timings: Timings,
}

impl RunConfig {
    /// Create a config with choice 0, one iteration and default labels/timings.
    pub fn new(identifier: impl Into<String>, login_url: &str, vote_url: &str) -> Result<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(Error::Config("identifier is required".into()));
        }
        Ok(Self {
            identifier,
            choice_index: 0,
            login_url: parse_url("login_url", login_url)?,
            vote_url: parse_url("vote_url", vote_url)?,
            max_iterations: 1,
            labels: Labels::default(),
            timings: Timings::default(),
        })
    }

    /// Set the preferred option index.
    pub fn choice_index(mut self, index: usize) -> Self {
        self.choice_index = index;
        self
    }

    /// Set the iteration bound.
    pub fn max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    /// Replace the label table.
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Replace the timings.
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(Error::Config("identifier is required".into()));
        }
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether `current` is on the voting surface (path-level match).
    pub fn is_voting_surface(&self, current: &str) -> bool {
        match Url::parse(current) {
            Ok(url) => url.path().contains(self.vote_url.path()),
            Err(_) => false,
        }
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Config(format!("{} is required", field)));
    }
    Url::parse(value).map_err(|e| Error::Config(format!("{} '{}' is invalid: {}", field, value, e)))
}
