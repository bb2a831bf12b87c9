use crate::page::PageDriver;
use crate::Result;
use serde_json::Value;

/// Every radio input on the page.
pub(crate) const RADIO_SELECTOR: &str = r#"input[type="radio"]"#;

/// Radio inputs belonging to one group.
pub(crate) fn group_selector(name: &str) -> String {
    format!(r#"input[type="radio"][name={}]"#, Value::from(name))
}

/// One question on the page: a radio group and how many options it has.
///
/// Only valid for the page it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionGroup {
    pub name: String,
    pub option_count: usize,
}

/// Distinct radio group names on the current page.
///
/// Order is first-seen; callers treat the result as a set. Radios without a
/// name are not part of any group.
pub(crate) async fn group_names<D>(driver: &D) -> Result<Vec<String>>
where
    D: PageDriver + ?Sized,
{
    let mut names: Vec<String> = Vec::new();
    for radio in driver.locate(RADIO_SELECTOR).await? {
        if let Some(name) = driver.attribute(&radio, "name").await? {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Groups on the current page with freshly counted options.
///
/// An empty result means the page has no questions left.
pub(crate) async fn discover<D>(driver: &D) -> Result<Vec<QuestionGroup>>
where
    D: PageDriver + ?Sized,
{
    let mut groups = Vec::new();
    for name in group_names(driver).await? {
        let option_count = driver.locate(&group_selector(&name)).await?.len();
        groups.push(QuestionGroup { name, option_count });
    }
    Ok(groups)
}
