use crate::{Error, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Login control captions ("دخول" is the Arabic "enter").
const DEFAULT_LOGIN: &[&str] = &["دخول", r"log\s*in", r"sign\s*in"];

/// Save control captions ("حفظ" is the Arabic "save").
const DEFAULT_SAVE: &[&str] = &["حفظ", "save", "submit"];

/// Role option text that identifies the voting subject ("طالب" = student).
const DEFAULT_SUBJECT_TYPE: &[&str] = &["طالب"];

/// Extra label patterns configured per site. Each list extends the built-in
/// table for that action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelOverrides {
    /// Patterns for the login control.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub login: Vec<String>,

    /// Patterns for the save control.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub save: Vec<String>,

    /// Substrings of the role option to pick on the login page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_type: Vec<String>,
}

impl LabelOverrides {
    pub fn is_empty(&self) -> bool {
        self.login.is_empty() && self.save.is_empty() && self.subject_type.is_empty()
    }
}

/// Compiled table of the visible captions the runner looks for.
///
/// Control captions are matched as case-insensitive regexes against the
/// element's visible text. Subject types are plain substrings of an option
/// label.
#[derive(Debug, Clone)]
pub struct Labels {
    login: Vec<Regex>,
    save: Vec<Regex>,
    subject_type: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            login: compile_all(DEFAULT_LOGIN).expect("built-in login patterns are valid"),
            save: compile_all(DEFAULT_SAVE).expect("built-in save patterns are valid"),
            subject_type: DEFAULT_SUBJECT_TYPE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Labels {
    /// Built-in table extended with site-specific patterns.
    pub fn with_overrides(overrides: &LabelOverrides) -> Result<Self> {
        let mut labels = Self::default();
        labels.login.extend(compile_all(&overrides.login)?);
        labels.save.extend(compile_all(&overrides.save)?);
        labels.subject_type.extend(
            overrides
                .subject_type
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned(),
        );
        Ok(labels)
    }

    /// Whether `text` reads like a login/sign-in control.
    pub fn is_login(&self, text: &str) -> bool {
        self.login.iter().any(|re| re.is_match(text))
    }

    /// Whether `text` reads like a save/submit control.
    pub fn is_save(&self, text: &str) -> bool {
        self.save.iter().any(|re| re.is_match(text))
    }

    /// First option whose text contains one of the subject-type labels.
    pub fn subject_option<'a>(&self, options: &'a [String]) -> Option<&'a str> {
        options
            .iter()
            .find(|opt| self.subject_type.iter().any(|label| opt.contains(label)))
            .map(|opt| opt.trim())
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p.as_ref())
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Config(format!("invalid label pattern '{}': {}", p.as_ref(), e)))
        })
        .collect()
}
