use ratatui::style::{Color, Style};

use super::{MatchKind, UnlinkFinder};

pub const OPEN_UNLINK_FINDER: &str = "Open Unlink Finder";

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub kind: MatchKind,
    pub label: &'static str,
    pub style: Style,
}

pub(crate) fn kind_style(kind: MatchKind) -> Style {
    let (bg, fg) = match kind {
        MatchKind::Alias => (Color::Rgb(125, 188, 255), Color::Black),
        MatchKind::Exact => (Color::Rgb(71, 151, 101), Color::White),
        MatchKind::Fuzzy => (Color::Rgb(220, 171, 121), Color::Black),
        MatchKind::Partial => (Color::Rgb(229, 233, 236), Color::Black),
        MatchKind::Redundant => (Color::Rgb(168, 42, 42), Color::White),
    };
    Style::default().bg(bg).fg(fg)
}

pub fn legend_entries() -> Vec<LegendEntry> {
    MatchKind::ALL
        .into_iter()
        .map(|kind| LegendEntry {
            kind,
            label: kind.label(),
            style: kind_style(kind),
        })
        .collect()
}

/// A mounted legend. Owns the classifier built when it was opened; dropping
/// or unmounting the handle turns highlighting off.
#[derive(Debug)]
pub struct LegendHandle {
    finder: UnlinkFinder,
}

impl LegendHandle {
    pub fn finder(&self) -> &UnlinkFinder {
        &self.finder
    }

    pub fn entries(&self) -> Vec<LegendEntry> {
        legend_entries()
    }
}

/// Where the legend lives while mounted.
#[derive(Debug, Default)]
pub struct LegendSlot {
    mounted: Option<LegendHandle>,
}

impl LegendSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts the legend unless one is already mounted. Returns whether it
    /// was mounted by this call.
    pub fn open(&mut self, finder: UnlinkFinder) -> bool {
        if self.mounted.is_some() {
            tracing::debug!("unlink finder already open");
            return false;
        }
        tracing::info!(
            minimum_characters = finder.settings().minimum_characters,
            "unlink finder opened"
        );
        self.mounted = Some(LegendHandle { finder });
        true
    }

    pub fn is_open(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn handle(&self) -> Option<&LegendHandle> {
        self.mounted.as_ref()
    }

    pub fn unmount(&mut self) -> Option<LegendHandle> {
        self.mounted.take()
    }
}
