use super::{pause, Progress};
use crate::config::{Labels, RunConfig};
use crate::page::{find_by_text, first, OptionChoice, PageDriver};
use crate::Result;
use tracing::debug;

/// The role dropdown on the login form.
pub(crate) const ROLE_SELECTOR: &str = "select";

/// Text-like input that takes the identifier.
pub(crate) const ID_INPUT_SELECTOR: &str = r#"input[type="text"], input[name*="id"]"#;

/// Clickable form controls (login and save buttons).
pub(crate) const BUTTON_SELECTOR: &str = r#"input[type="submit"], button"#;

/// Log in and open the voting page. Returns the URL landed on.
///
/// Missing controls are skipped with a message; only navigation and driver
/// errors are returned.
pub(crate) async fn authenticate<D>(
    driver: &D,
    config: &RunConfig,
    progress: &Progress<'_>,
) -> Result<String>
where
    D: PageDriver + ?Sized,
{
    progress.say("Navigating to login page...");
    driver.navigate(config.login_url.as_str()).await?;

    progress.say("Attempting to identify user type selection...");
    select_subject_type(driver, &config.labels, progress).await?;

    progress.say("Entering ID...");
    match first(driver, ID_INPUT_SELECTOR).await? {
        Some(input) => driver.fill(&input, &config.identifier).await?,
        None => progress.say("No ID field found, skipping"),
    }

    progress.say("Submitting login...");
    let labels = &config.labels;
    match find_by_text(driver, BUTTON_SELECTOR, |text| labels.is_login(text)).await? {
        Some(button) => driver.click(&button).await?,
        None => {
            progress.say("No login button found, pressing Enter");
            driver.press_key("Enter").await?;
        }
    }

    // The post-login redirect has no observable signal, so wait a fixed time.
    progress.say("Waiting for navigation to voting area...");
    pause(config.timings.post_login_ms).await;
    driver.navigate(config.vote_url.as_str()).await
}

/// Pick the subject role in the first dropdown, if the form has one.
///
/// Falls back to the second option when no label matches. That guess depends
/// on the site's option order.
async fn select_subject_type<D>(driver: &D, labels: &Labels, progress: &Progress<'_>) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    let Some(select) = first(driver, ROLE_SELECTOR).await? else {
        progress.say("No user type selector found");
        return Ok(());
    };

    let options = driver.option_labels(&select).await?;
    if let Some(label) = labels.subject_option(&options) {
        progress.say(format!("Selecting user type '{}'", label));
        driver
            .select_option(&select, &OptionChoice::Label(label.to_string()))
            .await?;
    } else if let Err(e) = driver.select_option(&select, &OptionChoice::Index(1)).await {
        debug!("positional user type fallback failed: {}", e);
        progress.say("No matching user type, leaving selector unchanged");
    } else {
        progress.say("No matching user type label, selected option 2");
    }
    Ok(())
}
