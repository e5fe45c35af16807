use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tokio::sync::mpsc;

use crate::api::client::RoamClient;
use crate::api::queries;
use crate::api::types::{PageTree, WriteAction};
use crate::error::{ErrorInfo, Result};
use roam_assistant::corpus::CorpusProvider;
use roam_assistant::popup::{run_action, ActionKind, EditorContext, FocusLocation, SearchRequest};
use roam_assistant::search::{SearchCandidate, StrategyRegistry};

use super::host::TuiHost;
use super::state::AppMessage;

async fn pull_tree(client: &RoamClient, uid: &str) -> Result<PageTree> {
    let (eid, selector) = queries::pull_page_tree(uid);
    let resp = client.pull(eid, &selector).await?;
    Ok(PageTree::from_pull_response(uid.to_string(), &resp.result))
}

fn send_error(tx: &mpsc::UnboundedSender<AppMessage>, e: &crate::error::RoamError) {
    let _ = tx.send(AppMessage::ApiError(ErrorInfo::from_roam_error(e)));
}

pub(super) fn spawn_fetch_daily_note(
    client: &RoamClient,
    date: NaiveDate,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let uid = queries::daily_note_uid_for_date(date.month(), date.day(), date.year());
    let client_clone = client.clone();
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        match pull_tree(&client_clone, &uid).await {
            Ok(mut tree) => {
                // today's page may not exist yet
                if tree.title.is_empty() {
                    tree.title = date.format("%B %-d, %Y").to_string();
                }
                let _ = tx_clone.send(AppMessage::PageLoaded(tree));
            }
            Err(e) => send_error(&tx_clone, &e),
        }
    });
}

pub(super) fn spawn_fetch_block(
    client: &RoamClient,
    uid: &str,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let client_clone = client.clone();
    let tx_clone = tx.clone();
    let uid = uid.to_string();
    tokio::spawn(async move {
        match pull_tree(&client_clone, &uid).await {
            Ok(tree) => {
                let _ = tx_clone.send(AppMessage::PageLoaded(tree));
            }
            Err(e) => send_error(&tx_clone, &e),
        }
    });
}

pub(super) fn spawn_fetch_sidebar(
    client: &RoamClient,
    uid: &str,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let client_clone = client.clone();
    let tx_clone = tx.clone();
    let uid = uid.to_string();
    tokio::spawn(async move {
        match pull_tree(&client_clone, &uid).await {
            Ok(tree) => {
                let _ = tx_clone.send(AppMessage::SidebarLoaded(tree));
            }
            Err(e) => send_error(&tx_clone, &e),
        }
    });
}

pub(super) fn spawn_load_unlink_corpus(
    corpus: Arc<dyn CorpusProvider>,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        match futures::try_join!(corpus.list_pages(), corpus.list_aliases()) {
            Ok((pages, aliases)) => {
                tracing::info!(
                    pages = pages.len(),
                    aliases = aliases.len(),
                    "unlink corpus loaded"
                );
                let _ = tx_clone.send(AppMessage::UnlinkCorpusLoaded { pages, aliases });
            }
            Err(e) => send_error(&tx_clone, &e),
        }
    });
}

/// Strategy failures never surface here; the registry reports them as
/// notices and returns what the other strategies found.
pub(super) fn spawn_search(
    registry: Arc<StrategyRegistry>,
    block_uid: &str,
    request: SearchRequest,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let tx_clone = tx.clone();
    let block_uid = block_uid.to_string();
    tokio::spawn(async move {
        let results = registry
            .search_all(&request.algorithms, &request.query)
            .await;
        let _ = tx_clone.send(AppMessage::SearchFinished {
            block_uid,
            query: request.query,
            results,
        });
    });
}

pub(super) fn spawn_action(
    client: &RoamClient,
    focus: Option<FocusLocation>,
    ctx: EditorContext,
    action: ActionKind,
    candidate: SearchCandidate,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let host = TuiHost::new(client.clone(), tx.clone(), focus);
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let result = run_action(&host, &ctx, action, &candidate).await;
        let _ = tx_clone.send(AppMessage::ActionFinished {
            block_uid: ctx.block_uid,
            uid: candidate.uid,
            result,
        });
    });
}

pub(super) fn spawn_write(
    client: &RoamClient,
    action: WriteAction,
    tx: &mpsc::UnboundedSender<AppMessage>,
) {
    let client_clone = client.clone();
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        if let Err(e) = client_clone.write(action).await {
            send_error(&tx_clone, &e);
        }
    });
}
