//! The smart popup: related-block suggestions while a block is being edited.

mod actions;
mod session;

pub use actions::{
    run_action, ActionKind, EditorContext, EditorHost, FocusLocation, SelectionRange,
};
pub use session::{KeyOutcome, PopupSession, PopupView, ResultItem, SearchRequest};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoamError};

/// Candidate text longer than this is truncated for display.
pub const BLOCK_TEXT_LENGTH_MAX: usize = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Shown whenever a block is edited.
    #[default]
    Always,
    /// Hidden until enabled with Ctrl+Shift+hotkey.
    Hotkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupSettings {
    pub results_per_page: usize,
    pub frequency: Frequency,
    pub hotkey: String,
    pub strategy_timeout_ms: u64,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            results_per_page: 5,
            frequency: Frequency::Always,
            hotkey: "Ctrl+m".into(),
            strategy_timeout_ms: 5000,
        }
    }
}

impl PopupSettings {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    /// The hotkey chord. Only character keys are accepted.
    pub fn hotkey_char(&self) -> Result<char> {
        match crate::hotkey::parse_key(&self.hotkey)?.code {
            crossterm::event::KeyCode::Char(c) => Ok(c.to_ascii_lowercase()),
            _ => Err(RoamError::Config(format!(
                "Popup hotkey must be a character key, got '{}'",
                self.hotkey
            ))),
        }
    }
}
