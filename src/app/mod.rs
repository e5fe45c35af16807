mod actions;
mod host;
mod input;
mod state;
mod tasks;
pub use state::*;

use actions::handle_action;
use input::{
    finalize_insert, handle_insert_key, handle_page_loaded, handle_sidebar_loaded,
    handle_ui_command,
};
use tasks::{
    spawn_action, spawn_fetch_block, spawn_fetch_daily_note, spawn_fetch_sidebar,
    spawn_load_unlink_corpus, spawn_search, spawn_write,
};

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use crate::api::client::RoamClient;
use crate::config::AppConfig;
use crate::error::{ErrorInfo, ErrorPopup, Result};
use crate::keys::KeybindingMap;
use roam_assistant::corpus::{CorpusProvider, RoamCorpus};
use roam_assistant::popup::FocusLocation;
use roam_assistant::search::{SearchCandidate, StrategyRegistry};
use roam_assistant::unlink::UnlinkFinder;

/// Everything the spawned tasks need from the outside world.
struct Services {
    client: RoamClient,
    corpus: Arc<dyn CorpusProvider>,
    registry: Arc<StrategyRegistry>,
}

fn dispatch_load_request(
    request: LoadRequest,
    services: &Services,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    match request {
        LoadRequest::DailyNote(date) => spawn_fetch_daily_note(&services.client, date, tx),
        LoadRequest::Main(uid) => spawn_fetch_block(&services.client, &uid, tx),
        LoadRequest::Sidebar(uid) => spawn_fetch_sidebar(&services.client, &uid, tx),
        LoadRequest::UnlinkCorpus => spawn_load_unlink_corpus(services.corpus.clone(), tx),
    }
}

fn dispatch_insert_effect(
    state: &AppState,
    effect: InsertEffect,
    services: &Services,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    match effect {
        InsertEffect::Save(write_action) => spawn_write(&services.client, write_action, tx),
        InsertEffect::Search(request) => {
            if let Some(edit) = state.input_mode.editing() {
                spawn_search(services.registry.clone(), &edit.block_uid, request, tx);
            }
        }
        InsertEffect::Dispatch {
            ctx,
            action,
            candidate,
        } => {
            let focus = Some(FocusLocation {
                block_uid: ctx.block_uid.clone(),
                window_id: Some(MAIN_WINDOW.into()),
            });
            spawn_action(&services.client, focus, ctx, action, candidate, tx);
        }
    }
}

fn handle_key(
    state: &mut AppState,
    key: &KeyEvent,
    keybindings: &KeybindingMap,
    services: &Services,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    if state.error_popup.is_some() {
        state.error_popup = None;
    } else if state.show_help {
        state.show_help = false;
    } else if state.is_editing() {
        if let Some(effect) = handle_insert_key(state, key) {
            dispatch_insert_effect(state, effect, services, tx);
        }
    } else if let Some(action) = keybindings.resolve(key) {
        if let Some(req) = handle_action(state, action) {
            dispatch_load_request(req, services, tx);
        }
    }
}

pub fn handle_search_finished(
    state: &mut AppState,
    block_uid: &str,
    query: String,
    results: Vec<SearchCandidate>,
) {
    match state.input_mode.editing_mut() {
        Some(edit) if edit.block_uid == block_uid => edit.popup.on_search_complete(query, results),
        _ => tracing::debug!(block_uid, "dropping results for a block no longer edited"),
    }
}

pub fn handle_action_finished(state: &mut AppState, block_uid: &str, uid: &str, result: Result<()>) {
    if let Some(edit) = state.input_mode.editing_mut() {
        if edit.block_uid == block_uid {
            edit.popup.complete_action(uid, &result);
        }
    }
    if let Err(e) = result {
        state.error_popup = Some(ErrorPopup::from_error_info(&ErrorInfo::from_roam_error(&e)));
    }
}

pub fn handle_unlink_corpus_loaded(
    state: &mut AppState,
    pages: Vec<crate::api::types::PageEntry>,
    aliases: roam_assistant::corpus::AliasMap,
) {
    state.unlink_loading = false;
    state.status_message = None;
    let finder = UnlinkFinder::new(pages, &aliases, state.unlink_settings.clone());
    if state.legend.open(finder) {
        state.refresh_highlights();
    }
}

pub fn handle_api_error(state: &mut AppState, error: ErrorInfo) {
    state.loading = false;
    state.unlink_loading = false;
    state.error_popup = Some(ErrorPopup::from_error_info(&error));
}

pub async fn run(config: &AppConfig, terminal: &mut DefaultTerminal) -> Result<()> {
    let keybindings =
        KeybindingMap::from_preset(&config.keybindings.preset, &config.keybindings.bindings)?;
    let mut state = AppState::new(&config.graph.name, keybindings.hints());
    state.popup_settings = config.smart_popup.clone();
    state.algorithms = config.algorithms.clone();
    state.unlink_settings = config.unlink_finder.clone();

    let (tx, mut rx) = mpsc::unbounded_channel::<AppMessage>();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel::<ErrorInfo>();

    let client = RoamClient::new(&config.graph.name, &config.graph.api_token);
    let corpus: Arc<dyn CorpusProvider> = Arc::new(RoamCorpus::new(client.clone()));
    let registry = StrategyRegistry::with_builtins(
        corpus.clone(),
        config.smart_popup.strategy_timeout(),
    )
    .with_notices(notice_tx);
    let services = Services {
        client,
        corpus,
        registry: Arc::new(registry),
    };

    spawn_fetch_daily_note(&services.client, state.current_date, &tx);

    // Strategy notices arrive on their own channel
    let forward_tx = tx.clone();
    tokio::spawn(async move {
        while let Some(info) = notice_rx.recv().await {
            if forward_tx.send(AppMessage::Notice(info)).is_err() {
                break;
            }
        }
    });

    // Spawn event reader task
    let event_tx = tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            match reader.next().await {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if event_tx.send(AppMessage::Key(key)).is_err() {
                        break;
                    }
                }
                Some(Err(_)) => break,
                None => break,
                _ => {}
            }
        }
    });

    // Main loop
    loop {
        terminal.draw(|frame| crate::ui::render(frame, &state))?;

        if let Some(msg) = rx.recv().await {
            match msg {
                AppMessage::Key(key) => {
                    handle_key(&mut state, &key, &keybindings, &services, &tx);
                }
                AppMessage::PageLoaded(tree) => handle_page_loaded(&mut state, tree),
                AppMessage::SidebarLoaded(tree) => handle_sidebar_loaded(&mut state, tree),
                AppMessage::SearchFinished {
                    block_uid,
                    query,
                    results,
                } => handle_search_finished(&mut state, &block_uid, query, results),
                AppMessage::ActionFinished {
                    block_uid,
                    uid,
                    result,
                } => handle_action_finished(&mut state, &block_uid, &uid, result),
                AppMessage::UnlinkCorpusLoaded { pages, aliases } => {
                    handle_unlink_corpus_loaded(&mut state, pages, aliases);
                }
                AppMessage::Ui(command) => {
                    let effects = handle_ui_command(&mut state, command);
                    if let Some(write_action) = effects.save {
                        spawn_write(&services.client, write_action, &tx);
                    }
                    if let Some(req) = effects.load {
                        dispatch_load_request(req, &services, &tx);
                    }
                }
                AppMessage::Notice(info) => {
                    tracing::warn!(?info, "search strategy notice");
                    state.error_popup = Some(ErrorPopup::from_error_info(&info));
                }
                AppMessage::ApiError(err) => handle_api_error(&mut state, err),
            }
        }

        if state.should_quit {
            break;
        }
    }

    // Don't lose an edit in progress
    if let Some(write_action) = finalize_insert(&mut state) {
        if let Err(e) = services.client.write(write_action).await {
            tracing::warn!(error = %e, "could not save block on exit");
        }
    }

    Ok(())
}
