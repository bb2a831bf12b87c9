//! In-memory voting portal for runner tests.

use crate::log::LogSink;
use crate::page::{ElementHandle, OptionChoice, PageDriver};
use crate::runner::{
    group_selector, Progress, BUTTON_SELECTOR, ID_INPUT_SELECTOR, RADIO_SELECTOR, ROLE_SELECTOR,
    SAVE_FALLBACK_SELECTOR,
};
use crate::{Error, Result, RunConfig};
use async_trait::async_trait;
use std::sync::Mutex;
use url::Url;

const LOGIN_URL: &str = "https://portal.example.edu/reg_eng_credit";
const VOTE_URL: &str = "https://portal.example.edu/reg_eng_credit/voting_data.aspx";

/// Config pointing at the default portal URLs.
pub fn config() -> RunConfig {
    RunConfig::new("12345678901234", LOGIN_URL, VOTE_URL).unwrap()
}

/// What a save click does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSave {
    /// Reload the voting page.
    Stay,
    /// Redirect to the home page; the voting page still opens.
    Bounce,
    /// Redirect to the done page; the voting page now redirects there too.
    Leave,
    /// Nothing happens.
    NoNavigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Login,
    Vote,
    Other,
}

/// Everything the portal saw.
#[derive(Debug, Clone)]
pub struct PortalState {
    screen: Screen,
    url: String,
    round: usize,
    left: bool,
    nav_seq: u64,
    pub navigations: Vec<String>,
    pub selected_role: Option<OptionChoice>,
    pub filled: Option<String>,
    pub logged_in: bool,
    pub keys: Vec<String>,
    pub clicked: Vec<String>,
    /// (round, group name, option position)
    pub checks: Vec<(usize, String, usize)>,
    pub submissions: usize,
    pub close_calls: usize,
}

/// Scriptable voting portal.
///
/// Each round is a list of option counts, one per group, named `q1`, `q2`...
/// A save advances to the next round.
pub struct FakePortal {
    login_url: String,
    vote_url: String,
    home_url: String,
    done_url: String,
    rounds: Vec<Vec<usize>>,
    endless: Option<Vec<usize>>,
    unnamed: usize,
    roles: Vec<String>,
    login_buttons: Vec<String>,
    save_buttons: Vec<String>,
    fallback_save: bool,
    after_save: AfterSave,
    fail_navigation_at: Option<usize>,
    fail_check_on_round: Option<usize>,
    state: Mutex<PortalState>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FakePortal {
    pub fn new() -> Self {
        let mut portal = Self {
            login_url: String::new(),
            vote_url: String::new(),
            home_url: String::new(),
            done_url: String::new(),
            rounds: Vec::new(),
            endless: None,
            unnamed: 0,
            roles: Vec::new(),
            login_buttons: strings(&["دخول"]),
            save_buttons: strings(&["حفظ"]),
            fallback_save: false,
            after_save: AfterSave::Stay,
            fail_navigation_at: None,
            fail_check_on_round: None,
            state: Mutex::new(PortalState {
                screen: Screen::Blank,
                url: "about:blank".to_string(),
                round: 0,
                left: false,
                nav_seq: 0,
                navigations: Vec::new(),
                selected_role: None,
                filled: None,
                logged_in: false,
                keys: Vec::new(),
                clicked: Vec::new(),
                checks: Vec::new(),
                submissions: 0,
                close_calls: 0,
            }),
        };
        portal.set_urls(LOGIN_URL, VOTE_URL);
        portal
    }

    fn set_urls(&mut self, login: &str, vote: &str) {
        let vote_url = Url::parse(vote).unwrap();
        let sibling = |page: &str| vote_url.join(page).unwrap().to_string();
        self.home_url = sibling("home.aspx");
        self.done_url = sibling("done.aspx");
        self.login_url = login.to_string();
        self.vote_url = vote.to_string();
    }

    /// Serve under other login and vote URLs.
    pub fn urls(mut self, login: &str, vote: &str) -> Self {
        self.set_urls(login, vote);
        self
    }

    pub fn rounds(mut self, rounds: Vec<Vec<usize>>) -> Self {
        self.rounds = rounds;
        self
    }

    /// The same groups on every round.
    pub fn endless(mut self, groups: Vec<usize>) -> Self {
        self.endless = Some(groups);
        self
    }

    /// Radios without a `name`, after the grouped ones.
    pub fn unnamed_radios(mut self, n: usize) -> Self {
        self.unnamed = n;
        self
    }

    pub fn role_options(mut self, labels: &[&str]) -> Self {
        self.roles = strings(labels);
        self
    }

    pub fn login_buttons(mut self, captions: &[&str]) -> Self {
        self.login_buttons = strings(captions);
        self
    }

    pub fn save_buttons(mut self, captions: &[&str]) -> Self {
        self.save_buttons = strings(captions);
        self
    }

    /// Offer a save control matched only by id.
    pub fn fallback_save(mut self, present: bool) -> Self {
        self.fallback_save = present;
        self
    }

    pub fn after_save(mut self, behavior: AfterSave) -> Self {
        self.after_save = behavior;
        self
    }

    /// Fail the n-th navigation (1-based).
    pub fn fail_navigation_at(mut self, n: usize) -> Self {
        self.fail_navigation_at = Some(n);
        self
    }

    /// Fail every radio check on the given zero-based round.
    pub fn fail_check_on_round(mut self, round: usize) -> Self {
        self.fail_check_on_round = Some(round);
        self
    }

    /// Start logged in on the voting page, without counting a navigation.
    pub fn on_vote_page(self) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.screen = Screen::Vote;
            state.url = self.vote_url.clone();
            state.logged_in = true;
        }
        self
    }

    pub fn vote_url(&self) -> String {
        self.vote_url.clone()
    }

    pub fn done_url(&self) -> String {
        self.done_url.clone()
    }

    pub fn home_url(&self) -> String {
        self.home_url.clone()
    }

    pub fn snapshot(&self) -> PortalState {
        self.state.lock().unwrap().clone()
    }

    fn groups(&self, round: usize) -> Vec<usize> {
        match self.rounds.get(round) {
            Some(groups) => groups.clone(),
            None => self.endless.clone().unwrap_or_default(),
        }
    }

    /// Elements matching `selector` on the current screen.
    fn count(&self, state: &PortalState, selector: &str) -> usize {
        match state.screen {
            Screen::Login => match selector {
                s if s == ROLE_SELECTOR => usize::from(!self.roles.is_empty()),
                s if s == ID_INPUT_SELECTOR => 1,
                s if s == BUTTON_SELECTOR => self.login_buttons.len(),
                _ => 0,
            },
            Screen::Vote => {
                let groups = self.groups(state.round);
                match selector {
                    s if s == RADIO_SELECTOR => groups.iter().sum::<usize>() + self.unnamed,
                    s if s == BUTTON_SELECTOR => self.save_buttons.len(),
                    s if s == SAVE_FALLBACK_SELECTOR => usize::from(self.fallback_save),
                    s => group_of(&groups, s).map(|g| groups[g]).unwrap_or(0),
                }
            }
            Screen::Blank | Screen::Other => 0,
        }
    }

    fn missing(element: &ElementHandle) -> Error {
        eoka::Error::ElementNotFound(element.to_string()).into()
    }

    fn resolve(&self, state: &PortalState, element: &ElementHandle) -> Result<()> {
        if element.index < self.count(state, &element.selector) {
            Ok(())
        } else {
            Err(Self::missing(element))
        }
    }

    fn enter_home(&self, state: &mut PortalState) {
        state.logged_in = true;
        state.screen = Screen::Other;
        state.url = self.home_url.clone();
    }
}

/// Index of the group whose selector is `selector`.
fn group_of(groups: &[usize], selector: &str) -> Option<usize> {
    (0..groups.len()).find(|g| group_selector(&format!("q{}", g + 1)) == selector)
}

#[async_trait]
impl PageDriver for FakePortal {
    async fn navigate(&self, url: &str) -> Result<String> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if self.fail_navigation_at == Some(state.navigations.len()) {
            return Err(Error::Navigation(format!("{}: connection refused", url)));
        }

        if url == self.login_url {
            state.screen = Screen::Login;
            state.url = url.to_string();
        } else if url == self.vote_url && state.left {
            state.screen = Screen::Other;
            state.url = self.done_url.clone();
        } else if url == self.vote_url && state.logged_in {
            state.screen = Screen::Vote;
            state.url = url.to_string();
        } else if url == self.vote_url {
            state.screen = Screen::Login;
            state.url = self.login_url.clone();
        } else {
            state.screen = Screen::Other;
            state.url = url.to_string();
        }
        state.nav_seq += 1;
        Ok(state.url.clone())
    }

    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let state = self.state.lock().unwrap();
        Ok((0..self.count(&state, selector))
            .map(|i| ElementHandle::new(selector, i))
            .collect())
    }

    async fn read_text(&self, element: &ElementHandle) -> Result<String> {
        let state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        let captions = match (state.screen, element.selector.as_str()) {
            (Screen::Login, BUTTON_SELECTOR) => &self.login_buttons,
            (Screen::Vote, BUTTON_SELECTOR) => &self.save_buttons,
            _ => return Ok(String::new()),
        };
        Ok(captions[element.index].clone())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        if state.screen != Screen::Vote || element.selector != RADIO_SELECTOR || name != "name" {
            return Ok(None);
        }
        let mut end = 0;
        for (g, options) in self.groups(state.round).iter().enumerate() {
            end += options;
            if element.index < end {
                return Ok(Some(format!("q{}", g + 1)));
            }
        }
        Ok(None)
    }

    async fn option_labels(&self, element: &ElementHandle) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        Ok(self.roles.clone())
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        state.filled = Some(text.to_string());
        Ok(())
    }

    async fn select_option(&self, element: &ElementHandle, choice: &OptionChoice) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        let found = match choice {
            OptionChoice::Label(label) => self.roles.iter().any(|r| r.trim() == label),
            OptionChoice::Index(i) => *i < self.roles.len(),
        };
        if !found {
            return Err(Self::missing(element));
        }
        state.selected_role = Some(choice.clone());
        Ok(())
    }

    async fn check(&self, element: &ElementHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        if self.fail_check_on_round == Some(state.round) {
            return Err(Self::missing(element));
        }
        let groups = self.groups(state.round);
        let g = group_of(&groups, &element.selector).ok_or_else(|| Self::missing(element))?;
        let round = state.round;
        state
            .checks
            .push((round, format!("q{}", g + 1), element.index));
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        self.resolve(&state, element)?;
        state.clicked.push(element.to_string());

        match state.screen {
            Screen::Login => {
                self.enter_home(&mut state);
                state.nav_seq += 1;
            }
            Screen::Vote => {
                state.submissions += 1;
                state.round += 1;
                match self.after_save {
                    AfterSave::Stay => state.nav_seq += 1,
                    AfterSave::Bounce => {
                        state.screen = Screen::Other;
                        state.url = self.home_url.clone();
                        state.nav_seq += 1;
                    }
                    AfterSave::Leave => {
                        state.left = true;
                        state.screen = Screen::Other;
                        state.url = self.done_url.clone();
                        state.nav_seq += 1;
                    }
                    AfterSave::NoNavigation => {}
                }
            }
            Screen::Blank | Screen::Other => {}
        }
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.keys.push(key.to_string());
        if key == "Enter" && state.screen == Screen::Login {
            self.enter_home(&mut state);
            state.nav_seq += 1;
        }
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout_ms: u64) -> Result<()> {
        let start = self.state.lock().unwrap().nav_seq;
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if self.state.lock().unwrap().nav_seq != start {
                return Ok(());
            }
        }
        Err(Error::Navigation(format!(
            "no navigation within {}ms",
            timeout_ms
        )))
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }
}

/// Sink that keeps every message.
#[derive(Default)]
pub struct Recorder {
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn progress(&self) -> Progress<'_> {
        Progress::new(self)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for Recorder {
    fn emit(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}
