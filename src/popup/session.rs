use std::collections::{HashMap, HashSet};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{ActionKind, Frequency, PopupSettings, BLOCK_TEXT_LENGTH_MAX};
use crate::hotkey::matches_chord;
use crate::error::Result;
use crate::search::{SearchAlgorithmSpec, SearchCandidate, StrategyRegistry};

/// Strategies to run for a query the session has not seen yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub algorithms: Vec<SearchAlgorithmSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not for the popup; the editor should handle it.
    Ignored,
    /// Swallowed by the popup.
    Consumed,
    Dispatch {
        action: ActionKind,
        candidate: SearchCandidate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub uid: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupView {
    Hidden,
    /// No strategies are configured.
    NoAlgorithms,
    Searching,
    Results {
        items: Vec<ResultItem>,
        action_mode: bool,
        armed: Option<usize>,
    },
}

/// Per-block popup state, created when a block enters edit mode.
#[derive(Debug)]
pub struct PopupSession {
    block_uid: String,
    query: String,
    cache: HashMap<String, Vec<SearchCandidate>>,
    excluded_uids: HashSet<String>,
    action_mode: bool,
    armed: Option<usize>,
    disabled: bool,
    results_per_page: usize,
    frequency: Frequency,
    /// Control (or Super) plus the configured character.
    hotkey: KeyEvent,
    algorithms: Vec<SearchAlgorithmSpec>,
}

impl PopupSession {
    pub fn new(
        block_uid: impl Into<String>,
        settings: &PopupSettings,
        algorithms: Vec<SearchAlgorithmSpec>,
    ) -> Self {
        let block_uid = block_uid.into();
        let hotkey = settings.hotkey_char().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid popup hotkey, using m");
            'm'
        });
        let mut excluded_uids = HashSet::new();
        excluded_uids.insert(block_uid.clone());
        Self {
            block_uid,
            query: String::new(),
            cache: HashMap::new(),
            excluded_uids,
            action_mode: false,
            armed: None,
            disabled: settings.frequency != Frequency::Always,
            results_per_page: settings.results_per_page,
            frequency: settings.frequency,
            hotkey: KeyEvent::new(KeyCode::Char(hotkey), KeyModifiers::CONTROL),
            algorithms,
        }
    }

    pub fn block_uid(&self) -> &str {
        &self.block_uid
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_action_mode(&self) -> bool {
        self.action_mode
    }

    pub fn armed(&self) -> Option<usize> {
        self.armed
    }

    pub fn excluded_uids(&self) -> &HashSet<String> {
        &self.excluded_uids
    }

    /// Records the new block text. Returns a request only when the query is
    /// non-empty and has no cached results.
    pub fn on_text_change(&mut self, text: &str) -> Option<SearchRequest> {
        if text != self.query {
            self.armed = None;
        }
        self.query = text.to_string();
        if self.query.is_empty() || self.algorithms.is_empty() {
            return None;
        }
        if self.cache.contains_key(&self.query) {
            tracing::debug!(query = %self.query, "popup cache hit");
            return None;
        }
        tracing::debug!(query = %self.query, "popup cache miss");
        Some(SearchRequest {
            query: self.query.clone(),
            algorithms: self.algorithms.clone(),
        })
    }

    /// Stores results under the query they were computed for, which may no
    /// longer be the current one.
    pub fn on_search_complete(&mut self, query: String, results: Vec<SearchCandidate>) {
        self.cache.insert(query, results);
    }

    /// [`on_text_change`](Self::on_text_change) followed by running the
    /// request inline.
    pub async fn update_query(&mut self, registry: &StrategyRegistry, text: &str) {
        if let Some(request) = self.on_text_change(text) {
            let results = registry
                .search_all(&request.algorithms, &request.query)
                .await;
            self.on_search_complete(request.query, results);
        }
    }

    pub fn visible_results(&self) -> Vec<SearchCandidate> {
        self.cache
            .get(&self.query)
            .map(|results| {
                results
                    .iter()
                    .filter(|c| !self.excluded_uids.contains(&c.uid))
                    .take(self.results_per_page)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> KeyOutcome {
        let control = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER);
        let shifted_hotkey =
            KeyEvent::new(self.hotkey.code, self.hotkey.modifiers | KeyModifiers::SHIFT);
        let shift = matches_chord(&shifted_hotkey, key);
        let is_hotkey = shift || matches_chord(&self.hotkey, key);

        if self.disabled {
            if is_hotkey && shift && self.frequency == Frequency::Hotkey {
                self.disabled = false;
                return KeyOutcome::Consumed;
            }
            return KeyOutcome::Ignored;
        }

        if is_hotkey {
            if shift {
                self.disabled = true;
            } else {
                self.action_mode = !self.action_mode;
            }
            self.armed = None;
            return KeyOutcome::Consumed;
        }

        if !self.action_mode {
            return KeyOutcome::Ignored;
        }

        let KeyCode::Char(c) = key.code else {
            return KeyOutcome::Ignored;
        };

        if let Some(digit) = c.to_digit(10).filter(|d| (1..=9).contains(d)) {
            let index = digit as usize - 1;
            let visible = self.visible_results();
            let Some(candidate) = visible.get(index) else {
                return KeyOutcome::Consumed;
            };
            if control {
                self.armed = Some(index);
                return KeyOutcome::Consumed;
            }
            return KeyOutcome::Dispatch {
                action: ActionKind::InsertAlias,
                candidate: candidate.clone(),
            };
        }

        if let (Some(index), Some(action)) = (self.armed, ActionKind::from_glyph(c)) {
            return match self.visible_results().get(index) {
                Some(candidate) => KeyOutcome::Dispatch {
                    action,
                    candidate: candidate.clone(),
                },
                None => KeyOutcome::Consumed,
            };
        }

        KeyOutcome::Ignored
    }

    /// Applies the outcome of a dispatched action. Failures leave the
    /// session untouched so the action can be retried.
    pub fn complete_action(&mut self, uid: &str, result: &Result<()>) {
        match result {
            Ok(()) => {
                self.excluded_uids.insert(uid.to_string());
                self.action_mode = false;
                self.armed = None;
            }
            Err(e) => tracing::warn!(uid, error = %e, "popup action failed"),
        }
    }

    pub fn view(&self) -> PopupView {
        if self.disabled || self.query.is_empty() {
            return PopupView::Hidden;
        }
        if self.algorithms.is_empty() {
            return PopupView::NoAlgorithms;
        }
        if !self.cache.contains_key(&self.query) {
            return PopupView::Searching;
        }
        PopupView::Results {
            items: self
                .visible_results()
                .into_iter()
                .map(|c| ResultItem {
                    text: display_text(&c.text),
                    uid: c.uid,
                })
                .collect(),
            action_mode: self.action_mode,
            armed: self.armed,
        }
    }
}

fn display_text(text: &str) -> String {
    if text.chars().count() > BLOCK_TEXT_LENGTH_MAX {
        let head: String = text.chars().take(BLOCK_TEXT_LENGTH_MAX - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
