//! # autovote-runner
//!
//! Browser automation for session-based voting forms. Log in with an
//! identifier, discover the radio groups on the voting page, pick a choice in
//! each, save, and verify the session moved on. Repeat until the page runs out
//! of questions or the iteration bound is hit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autovote_runner::{run_vote, BrowserOptions, RunConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> autovote_runner::Result<()> {
//! let config = RunConfig::new(
//!     "12345678901234",
//!     "https://portal.example.edu/login",
//!     "https://portal.example.edu/voting_data.aspx",
//! )?
//! .choice_index(1)
//! .max_iterations(5);
//!
//! let log = |message: &str| println!("{message}");
//! let summary = run_vote(&config, &BrowserOptions::default(), &log).await?;
//! println!("Rounds: {}", summary.iterations);
//! # Ok(())
//! # }
//! ```

mod config;
mod log;
mod page;
mod runner;

#[cfg(test)]
mod test_support;

pub use config::{
    LabelOverrides, Labels, NewSite, RunConfig, Site, SiteStore, Timings, SAFETY_CEILING,
};
pub use log::{LogBroadcast, LogLine, LogPayload, LogSink, ScopedLog};
pub use page::{BrowserOptions, ElementHandle, EokaPage, OptionChoice, PageDriver};
pub use runner::{
    run_vote, select, CompletionReason, Phase, QuestionGroup, RunState, RunSummary, Transition,
    VoteRunner,
};

/// Result type for autovote-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("site not found: {0}")]
    SiteNotFound(String),
}
