use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use super::legend::kind_style;
use super::{LinkAncestry, MatchSpan, UnlinkFinder};

/// One piece of a scanned text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text { text: String, offset: usize },
    /// Existing link syntax; never scanned.
    Link { text: String, offset: usize },
    Match(MatchSpan),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Text { text, .. } | Segment::Link { text, .. } => text,
            Segment::Match(span) => &span.text,
        }
    }

    fn shifted(self, by: usize) -> Self {
        match self {
            Segment::Text { text, offset } => Segment::Text {
                text,
                offset: offset + by,
            },
            Segment::Link { text, offset } => Segment::Link {
                text,
                offset: offset + by,
            },
            Segment::Match(mut span) => {
                span.start += by;
                span.end += by;
                Segment::Match(span)
            }
        }
    }
}

/// How a text node should be rendered: literal text interleaved with
/// decorated matches. Concatenating every segment's text yields the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    segments: Vec<Segment>,
}

impl Segmentation {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn plain(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self::new(vec![Segment::Text {
            text: text.to_string(),
            offset: 0,
        }])
    }

    /// Splices `text` around `spans`, which must be sorted and non-overlapping.
    pub fn from_spans(text: &str, spans: Vec<MatchSpan>) -> Self {
        let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = 0;
        for span in spans {
            if span.start > cursor {
                segments.push(Segment::Text {
                    text: text[cursor..span.start].to_string(),
                    offset: cursor,
                });
            }
            cursor = span.end;
            segments.push(Segment::Match(span));
        }
        if cursor < text.len() {
            segments.push(Segment::Text {
                text: text[cursor..].to_string(),
                offset: cursor,
            });
        }
        Self::new(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn matches(&self) -> impl Iterator<Item = &MatchSpan> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Match(span) => Some(span),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }

    pub(super) fn shifted(self, by: usize) -> Self {
        Self::new(self.segments.into_iter().map(|s| s.shifted(by)).collect())
    }

    /// A later pass: every literal segment is scanned again as its own text
    /// node. Matches and links from earlier passes are left as they are.
    pub fn rescan(&self, finder: &UnlinkFinder, ancestry: &LinkAncestry) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Text { text, offset } => {
                    let node = finder.scan_node(text, ancestry);
                    segments.extend(node.shifted(*offset).into_segments());
                }
                other => segments.push(other.clone()),
            }
        }
        Self::new(segments)
    }

    /// Repeats [`rescan`](Self::rescan) until a pass finds nothing new, at most `max_passes` times.
    pub fn settle(self, finder: &UnlinkFinder, ancestry: &LinkAncestry, max_passes: usize) -> Self {
        let mut current = self;
        for _ in 0..max_passes {
            let next = current.rescan(finder, ancestry);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

/// Renders segments as styled spans; unmatched text keeps `base`.
pub fn segments_to_spans(segments: &[Segment], base: Style) -> Vec<Span<'static>> {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { text, .. } => Span::styled(text.clone(), base),
            Segment::Link { text, .. } => {
                Span::styled(text.clone(), base.add_modifier(Modifier::UNDERLINED))
            }
            Segment::Match(span) => {
                let style = span
                    .kinds
                    .primary()
                    .map(|kind| base.patch(kind_style(kind)))
                    .unwrap_or(base);
                Span::styled(span.text.clone(), style)
            }
        })
        .collect()
}
