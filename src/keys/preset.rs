use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use roam_assistant::unlink::OPEN_UNLINK_FINDER;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    EditBlock,
    Exit,
    Quit,
    Help,
    ToggleSidebar,
    GoDaily,
    Refresh,
    OpenUnlinkFinder,
    CloseUnlinkFinder,
}

impl Action {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "move_up" => Some(Self::MoveUp),
            "move_down" => Some(Self::MoveDown),
            "edit_block" => Some(Self::EditBlock),
            "exit" => Some(Self::Exit),
            "quit" => Some(Self::Quit),
            "help" => Some(Self::Help),
            "toggle_sidebar" => Some(Self::ToggleSidebar),
            "go_daily" => Some(Self::GoDaily),
            "refresh" => Some(Self::Refresh),
            "open_unlink_finder" => Some(Self::OpenUnlinkFinder),
            "close_unlink_finder" => Some(Self::CloseUnlinkFinder),
            _ => None,
        }
    }

    pub fn hint_text(&self) -> &'static str {
        match self {
            Self::MoveUp => "up",
            Self::MoveDown => "down",
            Self::EditBlock => "edit",
            Self::Exit => "back",
            Self::Quit => "quit",
            Self::Help => "help",
            Self::ToggleSidebar => "sidebar",
            Self::GoDaily => "daily",
            Self::Refresh => "refresh",
            Self::OpenUnlinkFinder => OPEN_UNLINK_FINDER,
            Self::CloseUnlinkFinder => "close finder",
        }
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
}

fn shift(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::SHIFT)
}

fn ctrl_shift(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL | KeyModifiers::SHIFT)
}

pub fn vim_preset() -> HashMap<KeyEvent, Action> {
    let mut m = HashMap::new();
    m.insert(key(KeyCode::Char('k')), Action::MoveUp);
    m.insert(key(KeyCode::Up), Action::MoveUp);
    m.insert(key(KeyCode::Char('j')), Action::MoveDown);
    m.insert(key(KeyCode::Down), Action::MoveDown);
    m.insert(key(KeyCode::Char('i')), Action::EditBlock);
    m.insert(key(KeyCode::Enter), Action::EditBlock);
    m.insert(key(KeyCode::Esc), Action::Exit);
    m.insert(key(KeyCode::Char('q')), Action::Quit);
    m.insert(key(KeyCode::Char('?')), Action::Help);
    m.insert(key(KeyCode::Char('b')), Action::ToggleSidebar);
    m.insert(shift(KeyCode::Char('G')), Action::GoDaily);
    m.insert(key(KeyCode::Char('r')), Action::Refresh);
    m.insert(key(KeyCode::Char('u')), Action::OpenUnlinkFinder);
    m.insert(shift(KeyCode::Char('U')), Action::CloseUnlinkFinder);
    m
}

pub fn emacs_preset() -> HashMap<KeyEvent, Action> {
    let mut m = HashMap::new();
    m.insert(ctrl(KeyCode::Char('p')), Action::MoveUp);
    m.insert(key(KeyCode::Up), Action::MoveUp);
    m.insert(ctrl(KeyCode::Char('n')), Action::MoveDown);
    m.insert(key(KeyCode::Down), Action::MoveDown);
    m.insert(key(KeyCode::Enter), Action::EditBlock);
    m.insert(ctrl(KeyCode::Char('g')), Action::Exit);
    m.insert(ctrl(KeyCode::Char('q')), Action::Quit);
    m.insert(ctrl(KeyCode::Char('h')), Action::Help);
    m.insert(ctrl(KeyCode::Char('b')), Action::ToggleSidebar);
    m.insert(ctrl(KeyCode::Char('d')), Action::GoDaily);
    m.insert(ctrl(KeyCode::Char('r')), Action::Refresh);
    m.insert(ctrl(KeyCode::Char('u')), Action::OpenUnlinkFinder);
    m.insert(ctrl_shift(KeyCode::Char('u')), Action::CloseUnlinkFinder);
    m
}

pub fn vscode_preset() -> HashMap<KeyEvent, Action> {
    let mut m = HashMap::new();
    m.insert(key(KeyCode::Up), Action::MoveUp);
    m.insert(key(KeyCode::Down), Action::MoveDown);
    m.insert(key(KeyCode::Enter), Action::EditBlock);
    m.insert(key(KeyCode::Esc), Action::Exit);
    m.insert(ctrl(KeyCode::Char('q')), Action::Quit);
    m.insert(key(KeyCode::F(1)), Action::Help);
    m.insert(ctrl(KeyCode::Char('b')), Action::ToggleSidebar);
    m.insert(ctrl(KeyCode::Char('d')), Action::GoDaily);
    m.insert(key(KeyCode::F(5)), Action::Refresh);
    m.insert(ctrl(KeyCode::Char('u')), Action::OpenUnlinkFinder);
    m.insert(ctrl_shift(KeyCode::Char('u')), Action::CloseUnlinkFinder);
    m
}

pub fn get_preset(name: &str) -> Option<HashMap<KeyEvent, Action>> {
    match name.to_lowercase().as_str() {
        "vim" => Some(vim_preset()),
        "emacs" => Some(emacs_preset()),
        "vscode" => Some(vscode_preset()),
        _ => None,
    }
}
