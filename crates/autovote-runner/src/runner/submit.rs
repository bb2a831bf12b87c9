use super::auth::BUTTON_SELECTOR;
use super::{pause, Progress};
use crate::config::RunConfig;
use crate::page::{find_by_text, first, ElementHandle, PageDriver};
use crate::Result;
use tracing::debug;

/// Save controls recognised by their id or class when no caption matches.
pub(crate) const SAVE_FALLBACK_SELECTOR: &str =
    r#"input[id*="Submit"], input[id*="Save"], input[id*="btnSave"], button[class*="save"]"#;

/// Where a save left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Still on the voting page.
    Stayed,
    /// Redirected away, and the voting page opened again.
    Recovered,
    /// Redirected away for good. Treated as the end of the run.
    LeftSurface,
}

/// Save the current answers and check where the session ended up.
///
/// Returns the transition and the URL observed last.
pub(crate) async fn submit_and_verify<D>(
    driver: &D,
    config: &RunConfig,
    progress: &Progress<'_>,
) -> Result<(Transition, String)>
where
    D: PageDriver + ?Sized,
{
    match save_control(driver, config).await? {
        Some(button) => {
            // Listed first so the wait is armed before the click fires.
            let (waited, clicked) = tokio::join!(
                driver.wait_for_navigation(config.timings.navigation_timeout_ms),
                driver.click(&button),
            );
            clicked?;
            if let Err(e) = waited {
                debug!("no navigation after save: {}", e);
            }
        }
        None => progress.say("No save button found"),
    }

    pause(config.timings.settle_ms).await;

    let url = driver.current_url().await?;
    if config.is_voting_surface(&url) {
        return Ok((Transition::Stayed, url));
    }

    progress.say("Redirect detected. Returning to voting page...");
    match driver.navigate(config.vote_url.as_str()).await {
        Ok(landed) if config.is_voting_surface(&landed) => Ok((Transition::Recovered, landed)),
        Ok(landed) => Ok((Transition::LeftSurface, landed)),
        Err(e) => {
            debug!("corrective navigation failed: {}", e);
            Ok((Transition::LeftSurface, url))
        }
    }
}

/// Save button by caption, else by id/class.
async fn save_control<D>(driver: &D, config: &RunConfig) -> Result<Option<ElementHandle>>
where
    D: PageDriver + ?Sized,
{
    let labels = &config.labels;
    if let Some(button) = find_by_text(driver, BUTTON_SELECTOR, |text| labels.is_save(text)).await? {
        return Ok(Some(button));
    }
    first(driver, SAVE_FALLBACK_SELECTOR).await
}
