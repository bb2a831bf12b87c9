//! The page primitives the runner needs, and the browser that provides them.

mod eoka_page;

pub use eoka_page::{BrowserOptions, EokaPage};

use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// The `index`-th element matching a CSS selector at lookup time.
///
/// Handles are positional: they go stale once the page changes, so callers
/// look elements up again after every navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

/// How to pick an `<option>` in a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChoice {
    /// Option whose visible text equals this (trimmed).
    Label(String),
    /// Zero-based option position.
    Index(usize),
}

impl fmt::Display for OptionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(l) => write!(f, "label '{}'", l),
            Self::Index(i) => write!(f, "index {}", i),
        }
    }
}

/// Page-interaction primitives.
///
/// Lookups return an empty list rather than an error when nothing matches.
/// Errors are reserved for the page itself being unusable (navigation failed,
/// browser gone, handle no longer resolves).
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Go to `url`, block until the network is idle, return the landed URL.
    async fn navigate(&self, url: &str) -> Result<String>;

    /// All elements currently matching `selector`, in document order.
    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Visible text of the element (the value for `<input>` buttons).
    async fn read_text(&self, element: &ElementHandle) -> Result<String>;

    /// An attribute of the element, `None` when absent.
    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    /// Visible labels of a `<select>`'s options, in order.
    async fn option_labels(&self, element: &ElementHandle) -> Result<Vec<String>>;

    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<()>;

    async fn select_option(&self, element: &ElementHandle, choice: &OptionChoice) -> Result<()>;

    /// Check a radio or checkbox.
    async fn check(&self, element: &ElementHandle) -> Result<()>;

    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Press a key on whatever has focus.
    async fn press_key(&self, key: &str) -> Result<()>;

    /// Resolve once the next document load finishes, or error after `timeout_ms`.
    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Release the session. Further calls may fail.
    async fn close(&self) -> Result<()>;
}

/// First element matching `selector` whose visible text satisfies `pred`.
pub(crate) async fn find_by_text<D, F>(
    driver: &D,
    selector: &str,
    pred: F,
) -> Result<Option<ElementHandle>>
where
    D: PageDriver + ?Sized,
    F: Fn(&str) -> bool,
{
    for element in driver.locate(selector).await? {
        let text = driver.read_text(&element).await?;
        if pred(text.trim()) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

/// First element matching `selector`, if any.
pub(crate) async fn first<D>(driver: &D, selector: &str) -> Result<Option<ElementHandle>>
where
    D: PageDriver + ?Sized,
{
    Ok(driver.locate(selector).await?.into_iter().next())
}
