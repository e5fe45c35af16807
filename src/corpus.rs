//! Page, alias and block-text sources for the unlink finder and the default
//! search strategy.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::api::client::RoamClient;
use crate::api::queries;
use crate::api::types::{parse_alias_rows, parse_block_rows, parse_page_rows, PageEntry};
use crate::error::Result;

/// Alias text → canonical page title, in first-insertion order.
///
/// Re-inserting an alias replaces its title but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, title: impl Into<String>) {
        let alias = alias.into();
        let title = title.into();
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = title,
            None => self.entries.push((alias, title)),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, t)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: Into<String>, T: Into<String>> FromIterator<(A, T)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (A, T)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (alias, title) in iter {
            map.insert(alias, title);
        }
        map
    }
}

pub trait CorpusProvider: Send + Sync {
    fn list_pages(&self) -> BoxFuture<'_, Result<Vec<PageEntry>>>;

    fn list_aliases(&self) -> BoxFuture<'_, Result<AliasMap>>;

    /// Blocks whose text contains at least one of `tokens`, as `(uid, text)`.
    fn query_blocks_containing<'a>(
        &'a self,
        tokens: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<(String, String)>>>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    pub pages: Vec<PageEntry>,
    pub aliases: AliasMap,
    pub blocks: Vec<(String, String)>,
}

impl MemoryCorpus {
    pub fn with_blocks<U: Into<String>, T: Into<String>>(blocks: impl IntoIterator<Item = (U, T)>) -> Self {
        Self {
            blocks: blocks.into_iter().map(|(u, t)| (u.into(), t.into())).collect(),
            ..Self::default()
        }
    }
}

impl CorpusProvider for MemoryCorpus {
    fn list_pages(&self) -> BoxFuture<'_, Result<Vec<PageEntry>>> {
        let pages = self.pages.clone();
        async move { Ok(pages) }.boxed()
    }

    fn list_aliases(&self) -> BoxFuture<'_, Result<AliasMap>> {
        let aliases = self.aliases.clone();
        async move { Ok(aliases) }.boxed()
    }

    fn query_blocks_containing<'a>(
        &'a self,
        tokens: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<(String, String)>>> {
        async move {
            Ok(self
                .blocks
                .iter()
                .filter(|(_, text)| tokens.iter().any(|t| text.contains(t.as_str())))
                .cloned()
                .collect())
        }
        .boxed()
    }
}

/// Corpus backed by the Roam backend API.
#[derive(Clone)]
pub struct RoamCorpus {
    client: RoamClient,
}

impl RoamCorpus {
    pub fn new(client: RoamClient) -> Self {
        Self { client }
    }
}

impl CorpusProvider for RoamCorpus {
    fn list_pages(&self) -> BoxFuture<'_, Result<Vec<PageEntry>>> {
        async move {
            let resp = self.client.query(queries::all_page_titles(), vec![]).await?;
            Ok(parse_page_rows(&resp.result))
        }
        .boxed()
    }

    fn list_aliases(&self) -> BoxFuture<'_, Result<AliasMap>> {
        async move {
            let resp = self.client.query(queries::alias_blocks(), vec![]).await?;
            Ok(parse_alias_rows(&resp.result))
        }
        .boxed()
    }

    fn query_blocks_containing<'a>(
        &'a self,
        tokens: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<(String, String)>>> {
        async move {
            let (query, args) = queries::blocks_containing(tokens);
            let resp = self.client.query(query, args).await?;
            Ok(parse_block_rows(&resp.result))
        }
        .boxed()
    }
}
