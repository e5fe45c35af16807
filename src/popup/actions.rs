use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::search::SearchCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    InsertAlias,
    InsertReference,
    OpenInSidebar,
    AddAsChild,
    Navigate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        Self::InsertAlias,
        Self::InsertReference,
        Self::OpenInSidebar,
        Self::AddAsChild,
        Self::Navigate,
    ];

    pub fn glyph(self) -> char {
        match self {
            Self::InsertAlias => 'a',
            Self::InsertReference => 'r',
            Self::OpenInSidebar => 'o',
            Self::AddAsChild => 'c',
            Self::Navigate => 'n',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InsertAlias => "Insert Alias",
            Self::InsertReference => "Insert Reference",
            Self::OpenInSidebar => "Open In Sidebar",
            Self::AddAsChild => "Add As Child",
            Self::Navigate => "Navigate To Block",
        }
    }

    pub fn from_glyph(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.glyph() == c)
    }
}

/// Character offsets into the edited block's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    fn ordered(self) -> (usize, usize) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusLocation {
    pub block_uid: String,
    pub window_id: Option<String>,
}

/// The block being edited when an action is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorContext {
    pub block_uid: String,
    pub text: String,
    pub selection: SelectionRange,
}

/// Editor operations the actions are built from.
pub trait EditorHost: Send + Sync {
    fn set_block_text<'a>(&'a self, uid: &'a str, text: &'a str) -> BoxFuture<'a, Result<()>>;

    fn focused_location(&self) -> BoxFuture<'_, Result<Option<FocusLocation>>>;

    fn set_focus_and_selection<'a>(
        &'a self,
        location: &'a FocusLocation,
        selection: SelectionRange,
    ) -> BoxFuture<'a, Result<()>>;

    fn child_count<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<usize>>;

    /// Creates a child block and returns its uid.
    fn create_child_block<'a>(
        &'a self,
        parent_uid: &'a str,
        order: usize,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String>>;

    fn open_in_main_view<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<()>>;

    fn open_in_sidebar<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<()>>;
}

pub fn alias_markup(uid: &str) -> String {
    format!("[]((({})))", uid)
}

/// Replaces the selection with `insert`, working in characters.
fn splice(text: &str, selection: SelectionRange, insert: &str) -> String {
    let (start, end) = selection.ordered();
    let chars: Vec<char> = text.chars().collect();
    let start = start.min(chars.len());
    let end = end.clamp(start, chars.len());
    let mut out: String = chars[..start].iter().collect();
    out.push_str(insert);
    out.extend(&chars[end..]);
    out
}

async fn focus_or_current(host: &dyn EditorHost, ctx: &EditorContext) -> Result<FocusLocation> {
    Ok(host.focused_location().await?.unwrap_or_else(|| FocusLocation {
        block_uid: ctx.block_uid.clone(),
        window_id: None,
    }))
}

/// Performs `kind` for `candidate`. On `Ok` the caller should exclude the
/// candidate; on `Err` nothing is excluded.
pub async fn run_action(
    host: &dyn EditorHost,
    ctx: &EditorContext,
    kind: ActionKind,
    candidate: &SearchCandidate,
) -> Result<()> {
    tracing::debug!(action = kind.label(), uid = %candidate.uid, "running popup action");
    let uid = candidate.uid.as_str();
    let (start, _) = ctx.selection.ordered();

    match kind {
        ActionKind::InsertAlias => {
            let location = focus_or_current(host, ctx).await?;
            let text = splice(&ctx.text, ctx.selection, &alias_markup(uid));
            host.set_block_text(&ctx.block_uid, &text).await?;
            host.set_focus_and_selection(&location, SelectionRange::caret(start + 1))
                .await
        }
        ActionKind::InsertReference => {
            let location = focus_or_current(host, ctx).await?;
            let text = splice(&ctx.text, ctx.selection, &format!("(({}))", uid));
            host.set_block_text(&ctx.block_uid, &text).await?;
            let caret = start + 4 + uid.chars().count();
            host.set_focus_and_selection(&location, SelectionRange::caret(caret))
                .await
        }
        ActionKind::OpenInSidebar => {
            host.open_in_sidebar(uid).await?;
            let window_id = host.focused_location().await?.and_then(|l| l.window_id);
            let location = FocusLocation {
                block_uid: ctx.block_uid.clone(),
                window_id,
            };
            host.set_focus_and_selection(&location, ctx.selection).await
        }
        ActionKind::AddAsChild => {
            let window_id = host.focused_location().await?.and_then(|l| l.window_id);
            let order = host.child_count(&ctx.block_uid).await?;
            let child_uid = host
                .create_child_block(&ctx.block_uid, order, &alias_markup(uid))
                .await?;
            let location = FocusLocation {
                block_uid: child_uid,
                window_id,
            };
            host.set_focus_and_selection(&location, SelectionRange::caret(1))
                .await
        }
        ActionKind::Navigate => host.open_in_main_view(uid).await,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{HostCall, RecordingHost};
    use super::*;

    fn ctx(text: &str, start: usize, end: usize) -> EditorContext {
        EditorContext {
            block_uid: "self".into(),
            text: text.into(),
            selection: SelectionRange::new(start, end),
        }
    }

    fn focus(block: &str, caret: usize) -> HostCall {
        HostCall::Focus {
            location: FocusLocation {
                block_uid: block.into(),
                window_id: Some("main-window".into()),
            },
            selection: SelectionRange::caret(caret),
        }
    }

    #[test]
    fn alias_markup_wraps_uid() {
        assert_eq!(alias_markup("abc"), "[](((abc)))");
    }

    #[tokio::test]
    async fn insert_alias_replaces_selection() {
        let host = RecordingHost::new();
        let c = SearchCandidate::new("xyz", "target");
        run_action(&host, &ctx("see this now", 4, 8), ActionKind::InsertAlias, &c)
            .await
            .unwrap();
        assert_eq!(
            host.calls(),
            vec![
                HostCall::SetText {
                    uid: "self".into(),
                    text: "see [](((xyz))) now".into()
                },
                focus("self", 5),
            ]
        );
    }

    #[tokio::test]
    async fn insert_reference_places_caret_after_uid() {
        let host = RecordingHost::new();
        let c = SearchCandidate::new("abcde", "t");
        run_action(&host, &ctx("ab", 2, 2), ActionKind::InsertReference, &c)
            .await
            .unwrap();
        assert_eq!(
            host.calls(),
            vec![
                HostCall::SetText {
                    uid: "self".into(),
                    text: "ab((abcde))".into()
                },
                focus("self", 2 + 4 + 5),
            ]
        );
    }

    #[tokio::test]
    async fn splice_counts_characters_not_bytes() {
        let host = RecordingHost::new();
        let c = SearchCandidate::new("u", "t");
        run_action(&host, &ctx("café x", 5, 5), ActionKind::InsertReference, &c)
            .await
            .unwrap();
        assert_eq!(
            host.calls()[0],
            HostCall::SetText {
                uid: "self".into(),
                text: "café ((u))x".into()
            }
        );
    }

    #[tokio::test]
    async fn sidebar_restores_selection() {
        let host = RecordingHost::new();
        let c = SearchCandidate::new("side", "t");
        run_action(&host, &ctx("hello", 1, 3), ActionKind::OpenInSidebar, &c)
            .await
            .unwrap();
        assert_eq!(
            host.calls(),
            vec![
                HostCall::OpenSidebar("side".into()),
                HostCall::Focus {
                    location: FocusLocation {
                        block_uid: "self".into(),
                        window_id: Some("main-window".into())
                    },
                    selection: SelectionRange::new(1, 3),
                },
            ]
        );
    }

    #[tokio::test]
    async fn add_as_child_appends_and_focuses_child() {
        let mut host = RecordingHost::new();
        host.children = 3;
        let c = SearchCandidate::new("kid", "t");
        run_action(&host, &ctx("parent", 0, 0), ActionKind::AddAsChild, &c)
            .await
            .unwrap();
        assert_eq!(
            host.calls(),
            vec![
                HostCall::CreateChild {
                    parent: "self".into(),
                    order: 3,
                    text: "[](((kid)))".into()
                },
                focus("new-child", 1),
            ]
        );
    }

    #[tokio::test]
    async fn navigate_opens_main_view() {
        let host = RecordingHost::new();
        let c = SearchCandidate::new("there", "t");
        run_action(&host, &ctx("", 0, 0), ActionKind::Navigate, &c)
            .await
            .unwrap();
        assert_eq!(host.calls(), vec![HostCall::OpenMain("there".into())]);
    }

    #[tokio::test]
    async fn host_failure_propagates() {
        let mut host = RecordingHost::new();
        host.fail_writes = true;
        let c = SearchCandidate::new("x", "t");
        let result = run_action(&host, &ctx("a", 0, 0), ActionKind::InsertAlias, &c).await;
        assert!(result.is_err());
    }

    #[test]
    fn glyphs_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(ActionKind::from_glyph('z'), None);
    }
}
