use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use crossterm::event::KeyEvent;

use crate::api::types::{Block, PageEntry, PageTree, WriteAction};
use crate::edit_buffer::EditBuffer;
use crate::error::{ErrorInfo, ErrorPopup, Result};
use roam_assistant::corpus::AliasMap;
use roam_assistant::popup::{
    ActionKind, EditorContext, FocusLocation, PopupSession, PopupSettings, SearchRequest,
    SelectionRange,
};
use roam_assistant::search::{SearchAlgorithmSpec, SearchCandidate};
use roam_assistant::unlink::{LegendSlot, LinkAncestry, Segmentation, UnlinkSettings};

/// Rescans per block; later passes pick up repeated mentions.
pub const SCAN_PASSES: usize = 4;

pub const MAIN_WINDOW: &str = "main-window";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadRequest {
    DailyNote(NaiveDate),
    /// Open a page or block in the main view.
    Main(String),
    Sidebar(String),
    UnlinkCorpus,
}

/// Side effects produced while a block is being edited.
#[derive(Debug)]
pub enum InsertEffect {
    Save(WriteAction),
    Search(SearchRequest),
    Dispatch {
        ctx: EditorContext,
        action: ActionKind,
        candidate: SearchCandidate,
    },
}

/// Requests the editor host sends back to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    BlockTextReplaced {
        uid: String,
        text: String,
    },
    Focus {
        location: FocusLocation,
        selection: SelectionRange,
    },
    ChildCreated {
        parent_uid: String,
        order: usize,
        uid: String,
        text: String,
    },
    OpenMain(String),
    OpenSidebar(String),
}

#[derive(Debug)]
pub enum AppMessage {
    Key(KeyEvent),
    PageLoaded(PageTree),
    SidebarLoaded(PageTree),
    SearchFinished {
        block_uid: String,
        query: String,
        results: Vec<SearchCandidate>,
    },
    ActionFinished {
        block_uid: String,
        uid: String,
        result: Result<()>,
    },
    UnlinkCorpusLoaded {
        pages: Vec<PageEntry>,
        aliases: AliasMap,
    },
    Ui(UiCommand),
    /// A user-facing strategy failure.
    Notice(ErrorInfo),
    ApiError(ErrorInfo),
}

#[derive(Debug)]
pub struct EditState {
    pub buffer: EditBuffer,
    pub block_uid: String,
    pub original_text: String,
    pub popup: PopupSession,
}

#[derive(Debug)]
pub enum InputMode {
    Normal,
    Insert(EditState),
}

impl InputMode {
    pub fn editing(&self) -> Option<&EditState> {
        match self {
            InputMode::Insert(edit) => Some(edit),
            InputMode::Normal => None,
        }
    }

    pub fn editing_mut(&mut self) -> Option<&mut EditState> {
        match self {
            InputMode::Insert(edit) => Some(edit),
            InputMode::Normal => None,
        }
    }
}

pub struct AppState {
    pub graph_name: String,
    pub date_display: String,
    pub current_date: NaiveDate,
    pub page: Option<PageTree>,
    pub selected_block: usize,
    pub loading: bool,
    pub status_message: Option<String>,
    pub hints: Vec<(String, &'static str)>,
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub show_help: bool,
    pub error_popup: Option<ErrorPopup>,
    pub popup_settings: PopupSettings,
    pub algorithms: Vec<SearchAlgorithmSpec>,
    pub unlink_settings: UnlinkSettings,
    pub legend: LegendSlot,
    pub unlink_loading: bool,
    pub highlights: HashMap<String, Segmentation>,
    pub sidebar: Vec<PageTree>,
    pub show_sidebar: bool,
}

impl AppState {
    pub fn new(graph_name: &str, hints: Vec<(String, &'static str)>) -> Self {
        let now = Local::now();
        Self {
            graph_name: graph_name.to_string(),
            date_display: now.format("%b %d, %Y").to_string(),
            current_date: now.date_naive(),
            page: None,
            selected_block: 0,
            loading: true,
            status_message: Some("Loading today's notes...".into()),
            hints,
            should_quit: false,
            input_mode: InputMode::Normal,
            show_help: false,
            error_popup: None,
            popup_settings: PopupSettings::default(),
            algorithms: Vec::new(),
            unlink_settings: UnlinkSettings::default(),
            legend: LegendSlot::new(),
            unlink_loading: false,
            highlights: HashMap::new(),
            sidebar: Vec::new(),
            show_sidebar: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.input_mode, InputMode::Insert(_))
    }

    pub fn flat_block_count(&self) -> usize {
        self.page
            .as_ref()
            .map(|p| count_blocks_recursive(&p.blocks))
            .unwrap_or(0)
    }

    /// Starts editing `uid` with a fresh popup session.
    pub fn begin_edit(&mut self, uid: &str, text: &str, selection: Option<SelectionRange>) {
        let mut buffer = EditBuffer::new(text);
        if let Some(selection) = selection {
            buffer.set_selection(selection);
        }
        self.input_mode = InputMode::Insert(EditState {
            buffer,
            block_uid: uid.to_string(),
            original_text: text.to_string(),
            popup: PopupSession::new(uid, &self.popup_settings, self.algorithms.clone()),
        });
    }

    /// Recomputes unlinked-mention highlighting for every block on the page.
    pub fn refresh_highlights(&mut self) {
        self.highlights.clear();
        let (Some(handle), Some(page)) = (self.legend.handle(), self.page.as_ref()) else {
            return;
        };
        let finder = handle.finder();
        let mut pending = Vec::new();
        collect_blocks(&page.blocks, &mut pending);
        for block in pending {
            let ancestry = LinkAncestry::for_block(&page.blocks, &block.uid);
            let segmentation = finder
                .scan_block(&block.string, &ancestry)
                .settle(finder, &ancestry, SCAN_PASSES);
            self.highlights.insert(block.uid.clone(), segmentation);
        }
    }
}

fn collect_blocks<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
    for block in blocks {
        out.push(block);
        collect_blocks(&block.children, out);
    }
}

/// A block addressed by its position in the flattened outline.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInfo {
    pub block_uid: String,
    pub text: String,
    pub depth: usize,
}

pub(crate) fn count_blocks_recursive(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|b| {
            if b.open {
                1 + count_blocks_recursive(&b.children)
            } else {
                1
            }
        })
        .sum()
}

pub(crate) fn resolve_block_at_index(blocks: &[Block], index: usize) -> Option<BlockInfo> {
    fn walk(blocks: &[Block], depth: usize, target: usize, pos: &mut usize) -> Option<BlockInfo> {
        for block in blocks {
            if *pos == target {
                return Some(BlockInfo {
                    block_uid: block.uid.clone(),
                    text: block.string.clone(),
                    depth,
                });
            }
            *pos += 1;
            if block.open {
                if let Some(found) = walk(&block.children, depth + 1, target, pos) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(blocks, 0, index, &mut 0)
}

pub(crate) fn find_block_index(blocks: &[Block], uid: &str) -> Option<usize> {
    fn walk(blocks: &[Block], uid: &str, pos: &mut usize) -> Option<usize> {
        for block in blocks {
            if block.uid == uid {
                return Some(*pos);
            }
            *pos += 1;
            if block.open {
                if let Some(found) = walk(&block.children, uid, pos) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(blocks, uid, &mut 0)
}
