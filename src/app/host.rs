use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;

use crate::api::client::RoamClient;
use crate::api::queries;
use crate::api::types::{
    parse_count, BlockLocation, BlockUpdate, NewBlock, OrderValue, WriteAction,
};
use crate::error::{Result, RoamError};
use roam_assistant::popup::{EditorHost, FocusLocation, SelectionRange};

use super::state::{AppMessage, UiCommand};

pub(crate) fn generate_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("tui-{:x}", nanos)
}

/// Popup actions as seen from the terminal: graph writes go to the Roam
/// API, everything visible is sent back to the event loop as a
/// [`UiCommand`].
pub struct TuiHost {
    client: RoamClient,
    tx: mpsc::UnboundedSender<AppMessage>,
    focus: Mutex<Option<FocusLocation>>,
}

impl TuiHost {
    pub fn new(
        client: RoamClient,
        tx: mpsc::UnboundedSender<AppMessage>,
        focus: Option<FocusLocation>,
    ) -> Self {
        Self {
            client,
            tx,
            focus: Mutex::new(focus),
        }
    }

    fn send(&self, command: UiCommand) -> Result<()> {
        self.tx
            .send(AppMessage::Ui(command))
            .map_err(|_| RoamError::Host("editor is no longer running".into()))
    }

    fn set_focus(&self, location: Option<FocusLocation>) -> Result<()> {
        let mut focus = self
            .focus
            .lock()
            .map_err(|_| RoamError::Host("focus state unavailable".into()))?;
        *focus = location;
        Ok(())
    }
}

impl EditorHost for TuiHost {
    fn set_block_text<'a>(&'a self, uid: &'a str, text: &'a str) -> BoxFuture<'a, Result<()>> {
        async move {
            self.client
                .write(WriteAction::UpdateBlock {
                    block: BlockUpdate {
                        uid: uid.to_string(),
                        string: text.to_string(),
                    },
                })
                .await?;
            self.send(UiCommand::BlockTextReplaced {
                uid: uid.to_string(),
                text: text.to_string(),
            })
        }
        .boxed()
    }

    fn focused_location(&self) -> BoxFuture<'_, Result<Option<FocusLocation>>> {
        async move {
            let focus = self
                .focus
                .lock()
                .map_err(|_| RoamError::Host("focus state unavailable".into()))?;
            Ok(focus.clone())
        }
        .boxed()
    }

    fn set_focus_and_selection<'a>(
        &'a self,
        location: &'a FocusLocation,
        selection: SelectionRange,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            self.set_focus(Some(location.clone()))?;
            self.send(UiCommand::Focus {
                location: location.clone(),
                selection,
            })
        }
        .boxed()
    }

    fn child_count<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<usize>> {
        async move {
            let (query, args) = queries::child_count(uid);
            let resp = self.client.query(query, args).await?;
            Ok(parse_count(&resp.result))
        }
        .boxed()
    }

    fn create_child_block<'a>(
        &'a self,
        parent_uid: &'a str,
        order: usize,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            let uid = generate_uid();
            self.client
                .write(WriteAction::CreateBlock {
                    location: BlockLocation {
                        parent_uid: parent_uid.to_string(),
                        order: OrderValue::Index(order as i64),
                    },
                    block: NewBlock {
                        string: text.to_string(),
                        uid: Some(uid.clone()),
                    },
                })
                .await?;
            self.send(UiCommand::ChildCreated {
                parent_uid: parent_uid.to_string(),
                order,
                uid: uid.clone(),
                text: text.to_string(),
            })?;
            Ok(uid)
        }
        .boxed()
    }

    fn open_in_main_view<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<()>> {
        async move { self.send(UiCommand::OpenMain(uid.to_string())) }.boxed()
    }

    fn open_in_sidebar<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<()>> {
        async move { self.send(UiCommand::OpenSidebar(uid.to_string())) }.boxed()
    }
}
