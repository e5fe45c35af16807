use crate::api::types::{Block, PageTree};
use roam_assistant::search::{SearchAlgorithmSpec, DEFAULT_STRATEGY};

use super::AppState;

pub fn make_block(uid: &str, text: &str, order: i64) -> Block {
    Block {
        uid: uid.into(),
        string: text.into(),
        order,
        children: vec![],
        open: true,
    }
}

pub fn make_page(uid: &str, title: &str, blocks: Vec<Block>) -> PageTree {
    PageTree {
        uid: uid.into(),
        title: title.into(),
        blocks,
    }
}

pub fn test_state() -> AppState {
    let mut state = AppState::new("test-graph", vec![]);
    state.loading = false;
    state.status_message = None;
    state.algorithms = vec![SearchAlgorithmSpec::new(DEFAULT_STRATEGY, vec![])];
    state.page = Some(make_page(
        "10-18-2026",
        "October 18th, 2026",
        vec![
            make_block("b1", "Block one", 0),
            make_block("b2", "Block two", 1),
            make_block("b3", "Block three", 2),
        ],
    ));
    state
}

pub fn test_state_with_children() -> AppState {
    let mut state = test_state();
    let mut parent = make_block("b1", "Parent", 0);
    parent.children = vec![make_block("c1", "Child one", 0)];
    state.page = Some(make_page(
        "10-18-2026",
        "October 18th, 2026",
        vec![parent, make_block("b2", "Block two", 1)],
    ));
    state
}

/// A state already editing `uid`, whose text is set to `text` first.
pub fn editing_state(uid: &str, text: &str) -> AppState {
    let mut state = test_state();
    if let Some(block) = state.page.as_mut().and_then(|p| p.find_block_mut(uid)) {
        block.string = text.into();
    }
    state.begin_edit(uid, text, None);
    state
}
