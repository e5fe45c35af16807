use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{SearchCandidate, SearchStrategy, StrategyError, DEFAULT_STRATEGY};
use crate::corpus::CorpusProvider;

/// Blocks containing any whitespace-separated token of the query.
pub struct DefaultStrategy {
    corpus: Arc<dyn CorpusProvider>,
}

impl DefaultStrategy {
    pub fn new(corpus: Arc<dyn CorpusProvider>) -> Self {
        Self { corpus }
    }
}

impl SearchStrategy for DefaultStrategy {
    fn name(&self) -> &str {
        DEFAULT_STRATEGY
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        _params: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SearchCandidate>, StrategyError>> {
        async move {
            let tokens: Vec<String> = query.split_whitespace().map(String::from).collect();
            if tokens.is_empty() {
                return Ok(Vec::new());
            }
            let blocks = self.corpus.query_blocks_containing(&tokens).await?;
            Ok(blocks
                .into_iter()
                .map(|(uid, text)| SearchCandidate { uid, text })
                .collect())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;

    #[tokio::test]
    async fn blank_query_skips_the_corpus() {
        let strategy = DefaultStrategy::new(Arc::new(MemoryCorpus::with_blocks([("b1", " ")])));
        assert!(strategy.search("   ", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_token_matches_substrings() {
        let strategy = DefaultStrategy::new(Arc::new(MemoryCorpus::with_blocks([
            ("b1", "pineapple"),
            ("b2", "pear"),
        ])));
        let found = strategy.search("apple", &[]).await.unwrap();
        assert_eq!(found, vec![SearchCandidate::new("b1", "pineapple")]);
    }
}
