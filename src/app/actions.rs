use crate::keys::preset::Action;

use super::state::{resolve_block_at_index, AppState, LoadRequest};

pub fn handle_action(state: &mut AppState, action: &Action) -> Option<LoadRequest> {
    match action {
        Action::Quit => {
            state.should_quit = true;
            None
        }
        Action::MoveUp => {
            state.selected_block = state.selected_block.saturating_sub(1);
            None
        }
        Action::MoveDown => {
            let total = state.flat_block_count();
            if state.selected_block + 1 < total {
                state.selected_block += 1;
            }
            None
        }
        Action::EditBlock => {
            let page = state.page.as_ref()?;
            let info = resolve_block_at_index(&page.blocks, state.selected_block)?;
            state.begin_edit(&info.block_uid, &info.text, None);
            None
        }
        Action::Exit => {
            // editing is finished by the insert-mode handler, so this only
            // peels back the sidebar
            state.show_sidebar = false;
            None
        }
        Action::Help => {
            state.show_help = !state.show_help;
            None
        }
        Action::ToggleSidebar => {
            state.show_sidebar = !state.show_sidebar;
            None
        }
        Action::GoDaily => {
            state.loading = true;
            state.status_message = Some("Loading today's notes...".into());
            Some(LoadRequest::DailyNote(state.current_date))
        }
        Action::Refresh => {
            state.loading = true;
            match &state.page {
                Some(page) if !page.uid.is_empty() => Some(LoadRequest::Main(page.uid.clone())),
                _ => Some(LoadRequest::DailyNote(state.current_date)),
            }
        }
        Action::OpenUnlinkFinder => {
            if state.legend.is_open() {
                state.status_message = Some("Unlink finder is already open".into());
                return None;
            }
            if state.unlink_loading {
                return None;
            }
            state.unlink_loading = true;
            state.status_message = Some("Loading pages and aliases...".into());
            Some(LoadRequest::UnlinkCorpus)
        }
        Action::CloseUnlinkFinder => {
            if state.legend.unmount().is_some() {
                tracing::info!("unlink finder closed");
            }
            state.highlights.clear();
            None
        }
    }
}
