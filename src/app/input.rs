use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::types::{Block, BlockUpdate, PageTree, WriteAction};
use roam_assistant::popup::{EditorContext, KeyOutcome};

use super::state::{find_block_index, AppState, InputMode, InsertEffect, LoadRequest, UiCommand};

/// Leaves insert mode. Returns the write to persist when the text changed.
pub(super) fn finalize_insert(state: &mut AppState) -> Option<WriteAction> {
    let edit = match std::mem::replace(&mut state.input_mode, InputMode::Normal) {
        InputMode::Insert(edit) => edit,
        InputMode::Normal => return None,
    };

    let new_text = edit.buffer.to_string();
    if new_text == edit.original_text {
        return None;
    }
    if let Some(block) = state
        .page
        .as_mut()
        .and_then(|p| p.find_block_mut(&edit.block_uid))
    {
        block.string = new_text.clone();
    }
    state.refresh_highlights();
    Some(WriteAction::UpdateBlock {
        block: BlockUpdate {
            uid: edit.block_uid,
            string: new_text,
        },
    })
}

/// Insert-mode keys. The popup sees every key first and only what it
/// ignores reaches the text buffer.
pub(super) fn handle_insert_key(state: &mut AppState, key: &KeyEvent) -> Option<InsertEffect> {
    let edit = state.input_mode.editing_mut()?;

    match edit.popup.handle_key(key) {
        KeyOutcome::Consumed => {
            // the popup may have just been switched on
            let text = edit.buffer.to_string();
            return edit.popup.on_text_change(&text).map(InsertEffect::Search);
        }
        KeyOutcome::Dispatch { action, candidate } => {
            let ctx = EditorContext {
                block_uid: edit.block_uid.clone(),
                text: edit.buffer.to_string(),
                selection: edit.buffer.selection(),
            };
            return Some(InsertEffect::Dispatch {
                ctx,
                action,
                candidate,
            });
        }
        KeyOutcome::Ignored => {}
    }

    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let buffer = &mut edit.buffer;
    let before = buffer.to_string();

    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            return finalize_insert(state).map(InsertEffect::Save);
        }
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
        {
            buffer.insert_char(c)
        }
        KeyCode::Backspace => buffer.delete_back(),
        KeyCode::Delete => buffer.delete_forward(),
        KeyCode::Left if ctrl => buffer.move_word_left(),
        KeyCode::Right if ctrl => buffer.move_word_right(),
        KeyCode::Left if shift => buffer.select_left(),
        KeyCode::Right if shift => buffer.select_right(),
        KeyCode::Left => buffer.move_left(),
        KeyCode::Right => buffer.move_right(),
        KeyCode::Home => buffer.move_home(),
        KeyCode::End => buffer.move_end(),
        _ => return None,
    }

    let after = buffer.to_string();
    if after == before {
        return None;
    }
    edit.popup.on_text_change(&after).map(InsertEffect::Search)
}

/// What the event loop should do after a host command.
#[derive(Debug, Default)]
pub(super) struct UiEffects {
    pub save: Option<WriteAction>,
    pub load: Option<LoadRequest>,
}

pub(super) fn handle_ui_command(state: &mut AppState, command: UiCommand) -> UiEffects {
    let mut effects = UiEffects::default();
    match command {
        UiCommand::BlockTextReplaced { uid, text } => {
            if let Some(block) = state.page.as_mut().and_then(|p| p.find_block_mut(&uid)) {
                block.string = text.clone();
            }
            if let Some(edit) = state.input_mode.editing_mut() {
                if edit.block_uid == uid {
                    let selection = edit.buffer.selection();
                    edit.buffer.set_text(&text, selection);
                    // already persisted by the host
                    edit.original_text = text;
                }
            }
            state.refresh_highlights();
        }
        UiCommand::Focus {
            location,
            selection,
        } => {
            if let Some(edit) = state.input_mode.editing_mut() {
                if edit.block_uid == location.block_uid {
                    edit.buffer.set_selection(selection);
                    return effects;
                }
            }
            let Some(text) = state
                .page
                .as_ref()
                .and_then(|p| p.find_block(&location.block_uid))
                .map(|b| b.string.clone())
            else {
                tracing::debug!(uid = %location.block_uid, "focus target is not on this page");
                return effects;
            };
            effects.save = finalize_insert(state);
            state.begin_edit(&location.block_uid, &text, Some(selection));
            if let Some(idx) = state
                .page
                .as_ref()
                .and_then(|p| find_block_index(&p.blocks, &location.block_uid))
            {
                state.selected_block = idx;
            }
        }
        UiCommand::ChildCreated {
            parent_uid,
            order,
            uid,
            text,
        } => {
            if let Some(parent) = state
                .page
                .as_mut()
                .and_then(|p| p.find_block_mut(&parent_uid))
            {
                let at = order.min(parent.children.len());
                parent.children.insert(
                    at,
                    Block {
                        uid,
                        string: text,
                        order: order as i64,
                        children: vec![],
                        open: true,
                    },
                );
                parent.open = true;
            }
            state.refresh_highlights();
        }
        UiCommand::OpenMain(uid) => {
            effects.save = finalize_insert(state);
            state.loading = true;
            state.status_message = Some("Opening block...".into());
            effects.load = Some(LoadRequest::Main(uid));
        }
        UiCommand::OpenSidebar(uid) => {
            effects.load = Some(LoadRequest::Sidebar(uid));
        }
    }
    effects
}

pub(super) fn handle_page_loaded(state: &mut AppState, tree: PageTree) {
    if tree.blocks.is_empty() {
        state.status_message = Some(format!("{} has no blocks yet", tree.title));
    } else {
        state.status_message = None;
    }
    state.page = Some(tree);
    state.selected_block = 0;
    state.loading = false;
    state.refresh_highlights();
}

pub(super) fn handle_sidebar_loaded(state: &mut AppState, tree: PageTree) {
    state.sidebar.retain(|open| open.uid != tree.uid);
    state.sidebar.insert(0, tree);
    state.show_sidebar = true;
}
