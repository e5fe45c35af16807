use std::collections::HashSet;

use crate::api::types::Block;
use crate::markdown::extract_page_links;

/// Pages linked at one level of a block's ancestry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkLevel {
    linked_pages: HashSet<String>,
    boundary: bool,
}

impl LinkLevel {
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            linked_pages: pages.into_iter().map(Into::into).collect(),
            boundary: false,
        }
    }

    /// A level that marks the root of the block; the walk stops here.
    pub fn boundary<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            boundary: true,
            ..Self::new(pages)
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.boundary
    }
}

/// The chain of levels enclosing a text node, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAncestry {
    levels: Vec<LinkLevel>,
}

impl LinkAncestry {
    pub fn new(levels: Vec<LinkLevel>) -> Self {
        Self { levels }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Builds the chain for block `uid` from an outline: the block itself,
    /// then each parent, ending at the top-level block which is the boundary.
    pub fn for_block(blocks: &[Block], uid: &str) -> Self {
        let mut path = Vec::new();
        if !path_to(blocks, uid, &mut path) {
            return Self::none();
        }
        let last = path.len() - 1;
        let levels = path
            .iter()
            .rev()
            .enumerate()
            .map(|(i, block)| {
                let links = extract_page_links(&block.string);
                if i == last {
                    LinkLevel::boundary(links)
                } else {
                    LinkLevel::new(links)
                }
            })
            .collect();
        Self { levels }
    }

    /// Whether `title` is already linked at some level up to and including
    /// the boundary. Levels past the boundary are never examined.
    pub fn is_redundant(&self, title: &str) -> bool {
        for level in &self.levels {
            if level.linked_pages.contains(title) {
                return true;
            }
            if level.boundary {
                break;
            }
        }
        false
    }
}

fn path_to<'a>(blocks: &'a [Block], uid: &str, path: &mut Vec<&'a Block>) -> bool {
    for block in blocks {
        path.push(block);
        if block.uid == uid || path_to(&block.children, uid, path) {
            return true;
        }
        path.pop();
    }
    false
}
