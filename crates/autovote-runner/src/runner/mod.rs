mod auth;
mod discovery;
mod policy;
mod submit;

pub use discovery::QuestionGroup;
pub use policy::select;
pub use submit::Transition;

#[cfg(test)]
pub(crate) use auth::{BUTTON_SELECTOR, ID_INPUT_SELECTOR, ROLE_SELECTOR};
#[cfg(test)]
pub(crate) use discovery::RADIO_SELECTOR;
#[cfg(test)]
pub(crate) use submit::SAVE_FALLBACK_SELECTOR;

pub(crate) use discovery::group_selector;

use crate::config::{RunConfig, SAFETY_CEILING};
use crate::log::LogSink;
use crate::page::{BrowserOptions, ElementHandle, EokaPage, PageDriver};
use crate::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Authenticating,
    Voting,
    Completed,
    Failed,
}

/// Mutable state of one run. Never shared between runs.
#[derive(Debug, Clone)]
pub struct RunState {
    pub phase: Phase,
    /// Current voting round, starting at 1.
    pub iteration: u32,
    /// URL seen at the last checkpoint (after login, after each save).
    pub last_known_url: String,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: Phase::Authenticating,
            iteration: 1,
            last_known_url: String::new(),
        }
    }
}

/// Why a run stopped normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The voting page showed no question groups.
    NoMoreGroups,
    /// `max_iterations` rounds were done.
    IterationLimit,
    /// [`SAFETY_CEILING`] rounds were done.
    SafetyCeiling,
    /// A save redirected away and the voting page could not be reopened.
    LeftVotingSurface,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Voting rounds submitted.
    pub iterations: u32,
    /// Question groups answered across all rounds.
    pub groups_processed: usize,
    pub reason: CompletionReason,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Emits progress to the run's sink and mirrors it to tracing.
pub(crate) struct Progress<'a> {
    sink: &'a dyn LogSink,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(sink: &'a dyn LogSink) -> Self {
        Self { sink }
    }

    pub(crate) fn say(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!("{}", message);
        self.sink.emit(message);
    }
}

/// Fixed delay; zero returns immediately.
pub(crate) async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Drives one run against a page: log in once, then vote round by round.
pub struct VoteRunner<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    config: RunConfig,
    state: RunState,
}

impl<'a, D: PageDriver + ?Sized> VoteRunner<'a, D> {
    pub fn new(driver: &'a D, config: RunConfig) -> Self {
        Self {
            driver,
            config,
            state: RunState::default(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Run to a terminal phase, then release the page.
    ///
    /// The page is closed exactly once on both the success and the error
    /// path. Errors are reported to `sink` before they are returned.
    pub async fn run(&mut self, sink: &dyn LogSink) -> Result<RunSummary> {
        let progress = Progress::new(sink);
        let start = Instant::now();

        progress.say(format!("Starting automation for [{}]", self.config.identifier));
        progress.say(format!("Login URL: {}", self.config.login_url));
        progress.say(format!("Voting URL: {}", self.config.vote_url));
        progress.say(format!(
            "Choice Index: {} | Max Iterations: {}",
            self.config.choice_index, self.config.max_iterations
        ));

        let outcome = match self.drive(&progress).await {
            Ok(mut summary) => {
                self.state.phase = Phase::Completed;
                summary.duration_ms = start.elapsed().as_millis() as u64;
                info!(
                    "Run for [{}] completed after {} rounds ({:?})",
                    self.config.identifier, summary.iterations, summary.reason
                );
                progress.say("Automation task finished.");
                Ok(summary)
            }
            Err(e) => {
                self.state.phase = Phase::Failed;
                warn!("Run for [{}] failed: {}", self.config.identifier, e);
                progress.say(format!("Error: {}", e));
                Err(e)
            }
        };

        self.release(&progress).await;
        outcome
    }

    async fn drive(&mut self, progress: &Progress<'_>) -> Result<RunSummary> {
        self.config.validate()?;

        self.state.phase = Phase::Authenticating;
        self.state.last_known_url = auth::authenticate(self.driver, &self.config, progress).await?;

        self.state.phase = Phase::Voting;
        let bound = self.config.max_iterations.min(SAFETY_CEILING);
        let mut groups_processed = 0;

        loop {
            progress.say(format!(
                "--- Iteration {} of {} ---",
                self.state.iteration, bound
            ));

            let groups = discovery::discover(self.driver).await?;
            if groups.is_empty() {
                progress.say("No voting elements found. Process might be finished.");
                return Ok(self.summary(CompletionReason::NoMoreGroups, groups_processed));
            }

            progress.say(format!("Processing {} items...", groups.len()));
            for group in &groups {
                self.answer(group).await?;
            }
            groups_processed += groups.len();

            progress.say("Saving choices...");
            let (transition, url) =
                submit::submit_and_verify(self.driver, &self.config, progress).await?;
            self.state.last_known_url = url;
            self.state.iteration += 1;

            if transition == Transition::LeftSurface {
                progress.say("Could not return to voting page. Process might be complete.");
                return Ok(self.summary(CompletionReason::LeftVotingSurface, groups_processed));
            }

            if self.state.iteration > bound {
                let reason = if self.config.max_iterations > SAFETY_CEILING {
                    progress.say("Maximum iterations reached. Stopping safety break.");
                    CompletionReason::SafetyCeiling
                } else {
                    CompletionReason::IterationLimit
                };
                return Ok(self.summary(reason, groups_processed));
            }
        }
    }

    /// Check the chosen option of one group, using this round's count.
    async fn answer(&self, group: &QuestionGroup) -> Result<()> {
        let Some(position) = select(group.option_count, self.config.choice_index) else {
            debug!("group {} has no options", group.name);
            return Ok(());
        };
        let radio = ElementHandle::new(group_selector(&group.name), position);
        self.driver.check(&radio).await
    }

    fn summary(&self, reason: CompletionReason, groups_processed: usize) -> RunSummary {
        RunSummary {
            iterations: self.state.iteration - 1,
            groups_processed,
            reason,
            duration_ms: 0,
        }
    }

    async fn release(&self, progress: &Progress<'_>) {
        let delay = self.config.timings.close_delay_ms;
        if delay > 0 {
            progress.say(format!("Closing in {} seconds...", delay.div_ceil(1000)));
            pause(delay).await;
        }
        if let Err(e) = self.driver.close().await {
            warn!("Failed to release page: {}", e);
            progress.say(format!("Failed to release browser: {}", e));
        }
    }
}

/// Launch a browser and run `config` in it.
///
/// Every outcome is reported through `sink`. `Err` is returned only when the
/// browser cannot be launched or the target becomes unusable.
pub async fn run_vote(
    config: &RunConfig,
    browser: &BrowserOptions,
    sink: &dyn LogSink,
) -> Result<RunSummary> {
    if let Err(e) = config.validate() {
        sink.emit(&format!("Error: {}", e));
        return Err(e);
    }
    let page = match EokaPage::launch(browser, config.timings.network_idle_timeout_ms).await {
        Ok(page) => page,
        Err(e) => {
            sink.emit(&format!("Error: {}", e));
            return Err(e);
        }
    };
    VoteRunner::new(&page, config.clone()).run(sink).await
}
