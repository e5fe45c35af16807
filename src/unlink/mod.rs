//! Unlink finder: locates plain-text mentions of page titles and aliases and
//! classifies how well each mention matches.

mod ancestry;
mod legend;
mod segment;

pub use ancestry::{LinkAncestry, LinkLevel};
pub use legend::{legend_entries, LegendEntry, LegendHandle, LegendSlot, OPEN_UNLINK_FINDER};
pub use segment::{segments_to_spans, Segment, Segmentation};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::api::types::PageEntry;
use crate::corpus::AliasMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKind {
    Alias,
    Exact,
    Fuzzy,
    Partial,
    Redundant,
}

impl MatchKind {
    pub const ALL: [MatchKind; 5] = [
        MatchKind::Alias,
        MatchKind::Exact,
        MatchKind::Fuzzy,
        MatchKind::Partial,
        MatchKind::Redundant,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchKind::Alias => "Alias",
            MatchKind::Exact => "Exact",
            MatchKind::Fuzzy => "Fuzzy",
            MatchKind::Partial => "Partial",
            MatchKind::Redundant => "Redundant",
        }
    }
}

/// Set of match kinds attached to one span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MatchKinds(u8);

impl MatchKinds {
    pub fn only(kind: MatchKind) -> Self {
        Self(kind.bit())
    }

    pub fn insert(&mut self, kind: MatchKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: MatchKind) {
        self.0 &= !kind.bit();
    }

    pub fn contains(&self, kind: MatchKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = MatchKind> + '_ {
        MatchKind::ALL.into_iter().filter(|k| self.contains(*k))
    }

    /// The kind that decides how the span is decorated.
    pub fn primary(&self) -> Option<MatchKind> {
        [
            MatchKind::Redundant,
            MatchKind::Alias,
            MatchKind::Partial,
            MatchKind::Fuzzy,
            MatchKind::Exact,
        ]
        .into_iter()
        .find(|k| self.contains(*k))
    }
}

/// A located mention. `start`/`end` are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub text: String,
    pub matched_title: String,
    pub kinds: MatchKinds,
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkSettings {
    #[serde(default = "default_minimum_characters")]
    pub minimum_characters: usize,
    #[serde(default)]
    pub alias_case_sensitive: bool,
}

impl Default for UnlinkSettings {
    fn default() -> Self {
        Self {
            minimum_characters: default_minimum_characters(),
            alias_case_sensitive: false,
        }
    }
}

fn default_minimum_characters() -> usize {
    2
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassificationError {
    #[error("alias {alias:?} is not a valid pattern: {source}")]
    InvalidAliasPattern {
        alias: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
struct AliasPattern {
    alias: String,
    title: String,
    /// Word aliases reject occurrences glued to a hyphen.
    word: bool,
    regex: Result<Regex, regex::Error>,
}

impl AliasPattern {
    fn new(alias: &str, title: &str, case_sensitive: bool) -> Self {
        let word = is_plain_word(alias);
        let pattern = if word {
            format!(r"\b{}\b", regex::escape(alias))
        } else {
            alias.to_string()
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!case_sensitive)
            .build();
        Self {
            alias: alias.to_string(),
            title: title.to_string(),
            word,
            regex,
        }
    }

    fn first_match(&self, text: &str) -> Result<Option<(usize, usize)>, ClassificationError> {
        let regex = self
            .regex
            .as_ref()
            .map_err(|e| ClassificationError::InvalidAliasPattern {
                alias: self.alias.clone(),
                source: e.clone(),
            })?;
        Ok(regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .find(|m| !self.word || !hyphen_adjacent(text, m.start(), m.end()))
            .map(|m| (m.start(), m.end())))
    }
}

/// Classifier for one unlink-finder invocation: the alias patterns are built
/// once and the pages are ordered longest title first.
#[derive(Debug, Clone)]
pub struct UnlinkFinder {
    aliases: Vec<AliasPattern>,
    pages: Vec<PageEntry>,
    settings: UnlinkSettings,
}

impl UnlinkFinder {
    pub fn new(mut pages: Vec<PageEntry>, aliases: &AliasMap, settings: UnlinkSettings) -> Self {
        pages.retain(|p| !p.title.is_empty());
        pages.sort_by(|a, b| b.title.chars().count().cmp(&a.title.chars().count()));
        let aliases = aliases
            .iter()
            .map(|(alias, title)| AliasPattern::new(alias, title, settings.alias_case_sensitive))
            .collect();
        Self {
            aliases,
            pages,
            settings,
        }
    }

    pub fn settings(&self) -> &UnlinkSettings {
        &self.settings
    }

    /// One classification pass over a text node.
    ///
    /// Each alias and each page contributes at most its first occurrence;
    /// occurrences overlapping an earlier accepted span are dropped.
    pub fn classify(
        &self,
        text: &str,
        ancestry: &LinkAncestry,
    ) -> Result<Vec<MatchSpan>, ClassificationError> {
        let mut spans: Vec<MatchSpan> = Vec::new();

        for pattern in &self.aliases {
            let Some((start, end)) = pattern.first_match(text)? else {
                continue;
            };
            if spans.iter().any(|s| s.overlaps(start, end)) {
                continue;
            }
            spans.push(MatchSpan {
                text: text[start..end].to_string(),
                matched_title: pattern.title.clone(),
                kinds: MatchKinds::only(MatchKind::Alias),
                start,
                end,
            });
        }

        for page in &self.pages {
            if page.title.chars().count() < self.settings.minimum_characters {
                continue;
            }
            let Some((start, end)) = find_ignore_case(text, &page.title) else {
                continue;
            };
            if spans.iter().any(|s| s.overlaps(start, end)) {
                continue;
            }
            let matched = &text[start..end];
            spans.push(MatchSpan {
                text: matched.to_string(),
                matched_title: page.title.clone(),
                kinds: page_match_kinds(text, start, end, &page.title, ancestry),
                start,
                end,
            });
        }

        spans.sort_by_key(|s| s.start);
        Ok(spans)
    }

    /// Classifies a node and projects it into segments. A node that fails to
    /// classify is returned as a single literal segment.
    pub fn scan_node(&self, text: &str, ancestry: &LinkAncestry) -> Segmentation {
        match self.classify(text, ancestry) {
            Ok(spans) => Segmentation::from_spans(text, spans),
            Err(e) => {
                tracing::warn!(error = %e, "skipping text node");
                Segmentation::plain(text)
            }
        }
    }

    /// Scans the plain-text runs of a block's raw string. Existing links are
    /// kept as link segments and never matched against.
    pub fn scan_block(&self, block_text: &str, ancestry: &LinkAncestry) -> Segmentation {
        let mut segments = Vec::new();
        for run in crate::markdown::split_links(block_text) {
            if run.is_link {
                segments.push(Segment::Link {
                    text: run.text,
                    offset: run.offset,
                });
            } else {
                let node = self.scan_node(&run.text, ancestry);
                segments.extend(node.shifted(run.offset).into_segments());
            }
        }
        Segmentation::new(segments)
    }
}

fn page_match_kinds(
    text: &str,
    start: usize,
    end: usize,
    title: &str,
    ancestry: &LinkAncestry,
) -> MatchKinds {
    if ancestry.is_redundant(title) {
        return MatchKinds::only(MatchKind::Redundant);
    }
    let mut kinds = MatchKinds::only(MatchKind::Exact);
    if &text[start..end] != title {
        kinds.remove(MatchKind::Exact);
        kinds.insert(MatchKind::Fuzzy);
    }
    if word_char_adjacent(text, start, end) {
        kinds.remove(MatchKind::Exact);
        kinds.insert(MatchKind::Partial);
    }
    kinds
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_plain_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

fn neighbours(text: &str, start: usize, end: usize) -> (Option<char>, Option<char>) {
    (text[..start].chars().next_back(), text[end..].chars().next())
}

fn hyphen_adjacent(text: &str, start: usize, end: usize) -> bool {
    let (before, after) = neighbours(text, start, end);
    before == Some('-') || after == Some('-')
}

fn word_char_adjacent(text: &str, start: usize, end: usize) -> bool {
    let (before, after) = neighbours(text, start, end);
    before.is_some_and(is_word_char) || after.is_some_and(is_word_char)
}

/// First case-insensitive occurrence of `needle`, as byte offsets into `haystack`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    haystack.char_indices().find_map(|(start, _)| {
        prefix_len_ignore_case(&haystack[start..], needle).map(|len| (start, start + len))
    })
}

fn prefix_len_ignore_case(s: &str, needle: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    let mut consumed = 0;
    for n in needle.chars() {
        let (i, c) = chars.next()?;
        if !c.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
        consumed = i + c.len_utf8();
    }
    Some(consumed)
}
