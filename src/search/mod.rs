//! Pluggable search strategies for the smart popup.

mod custom;
mod default;

pub use custom::{parse_script_output, strip_code_fence, CustomStrategy};
pub use default::DefaultStrategy;

use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::corpus::{CorpusProvider, MemoryCorpus};
use crate::error::{ErrorInfo, RoamError};

pub const DEFAULT_STRATEGY: &str = "Default";
pub const CUSTOM_STRATEGY: &str = "Custom";

/// A block suggested for the current query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub uid: String,
    pub text: String,
}

impl SearchCandidate {
    pub fn new(uid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            text: text.into(),
        }
    }
}

/// A configured strategy instance: which strategy to run and its field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAlgorithmSpec {
    pub name: String,
    #[serde(default = "generate_uid")]
    pub uid: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SearchAlgorithmSpec {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            uid: generate_uid(),
            fields,
        }
    }
}

fn generate_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("alg-{:x}", nanos)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Text,
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

/// What the configuration surface needs to know to offer a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyDescriptor {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl StrategyDescriptor {
    /// Checks configured field values against this contract. Every `Script`
    /// field must hold a non-blank script.
    pub fn check_fields(&self, values: &[String]) -> Result<(), String> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.kind != FieldKind::Script {
                continue;
            }
            let present = values
                .get(i)
                .is_some_and(|v| !strip_code_fence(v).is_empty());
            if !present {
                return Err(format!(
                    "{} algorithm needs a {} as field {}",
                    self.name,
                    field.name,
                    i + 1
                ));
            }
        }
        Ok(())
    }
}

/// Descriptors of the strategies every registry starts with.
pub fn builtin_descriptors() -> Vec<StrategyDescriptor> {
    StrategyRegistry::with_builtins(Arc::new(MemoryCorpus::default()), Duration::ZERO).descriptors()
}

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("no script configured")]
    MissingScript,
    #[error("failed to start script: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("script exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },
    #[error("script output is malformed: {0}")]
    MalformedOutput(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("corpus query failed: {0}")]
    Corpus(#[from] RoamError),
}

pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Whether failures reflect user-authored configuration and should be
    /// surfaced to the user rather than only logged.
    fn user_authored(&self) -> bool {
        false
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        params: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SearchCandidate>, StrategyError>>;
}

/// Named strategies plus the adapter that makes every call total and bounded.
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn SearchStrategy>>,
    timeout: Duration,
    notices: Option<mpsc::UnboundedSender<ErrorInfo>>,
}

impl StrategyRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            strategies: Vec::new(),
            timeout,
            notices: None,
        }
    }

    /// Registry with the built-in `Default` and `Custom` strategies.
    pub fn with_builtins(corpus: Arc<dyn CorpusProvider>, timeout: Duration) -> Self {
        let mut registry = Self::new(timeout);
        registry.register(Arc::new(DefaultStrategy::new(corpus)));
        registry.register(Arc::new(CustomStrategy::new()));
        registry
    }

    /// Sends user-facing notices for failing user-authored strategies to `tx`.
    pub fn with_notices(mut self, tx: mpsc::UnboundedSender<ErrorInfo>) -> Self {
        self.notices = Some(tx);
        self
    }

    /// Registers a strategy, replacing any previous one with the same name.
    pub fn register(&mut self, strategy: Arc<dyn SearchStrategy>) {
        self.strategies.retain(|s| s.name() != strategy.name());
        self.strategies.push(strategy);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SearchStrategy>> {
        self.strategies.iter().find(|s| s.name() == name)
    }

    pub fn descriptors(&self) -> Vec<StrategyDescriptor> {
        self.strategies
            .iter()
            .map(|s| StrategyDescriptor {
                name: s.name().to_string(),
                fields: s.fields(),
            })
            .collect()
    }

    /// Runs one strategy by name. Never fails: errors, timeouts and unknown
    /// names all produce an empty result.
    pub async fn run_algorithm(
        &self,
        name: &str,
        params: &[String],
        query: &str,
    ) -> Vec<SearchCandidate> {
        let Some(strategy) = self.get(name) else {
            tracing::warn!(algorithm = name, "unknown search algorithm");
            return Vec::new();
        };

        let outcome = match tokio::time::timeout(self.timeout, strategy.search(query, params)).await
        {
            Ok(result) => result,
            Err(_) => Err(StrategyError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(candidates) => {
                tracing::debug!(algorithm = name, count = candidates.len(), "strategy finished");
                candidates
            }
            Err(e) => {
                tracing::warn!(algorithm = name, error = %e, "strategy failed");
                if strategy.user_authored() {
                    if let Some(tx) = &self.notices {
                        let _ = tx.send(ErrorInfo::Strategy {
                            algorithm: name.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
                Vec::new()
            }
        }
    }

    /// Runs every configured instance concurrently and concatenates the
    /// results in declaration order.
    pub async fn search_all(
        &self,
        algorithms: &[SearchAlgorithmSpec],
        query: &str,
    ) -> Vec<SearchCandidate> {
        let runs = algorithms
            .iter()
            .map(|a| self.run_algorithm(&a.name, &a.fields, query));
        join_all(runs).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use futures::FutureExt;

    use super::{SearchCandidate, SearchStrategy, StrategyError};

    /// Returns fixed candidates and counts how often it was asked.
    pub struct CountingStrategy {
        pub name: &'static str,
        pub results: Vec<SearchCandidate>,
        pub calls: Arc<AtomicUsize>,
        pub delay_ms: u64,
        pub fail: bool,
    }

    impl CountingStrategy {
        pub fn new(name: &'static str, results: Vec<SearchCandidate>) -> Self {
            Self {
                name,
                results,
                calls: Arc::new(AtomicUsize::new(0)),
                delay_ms: 0,
                fail: false,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchStrategy for CountingStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn user_authored(&self) -> bool {
            true
        }

        fn search<'a>(
            &'a self,
            _query: &'a str,
            _params: &'a [String],
        ) -> BoxFuture<'a, Result<Vec<SearchCandidate>, StrategyError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if self.delay_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
                }
                if self.fail {
                    return Err(StrategyError::MalformedOutput("boom".into()));
                }
                Ok(self.results.clone())
            }
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::CountingStrategy;
    use super::*;
    use crate::corpus::MemoryCorpus;

    fn spec(name: &str, fields: &[&str]) -> SearchAlgorithmSpec {
        SearchAlgorithmSpec {
            name: name.into(),
            uid: format!("{}-uid", name),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn default_strategy_ors_tokens_in_corpus_order() {
        let corpus = MemoryCorpus::with_blocks([
            ("b1", "I like apple pie"),
            ("b2", "no fruit here"),
            ("b3", "banana bread"),
        ]);
        let registry = StrategyRegistry::with_builtins(Arc::new(corpus), Duration::from_secs(1));

        let results = registry
            .run_algorithm(DEFAULT_STRATEGY, &[], "apple banana")
            .await;
        assert_eq!(
            results,
            vec![
                SearchCandidate::new("b1", "I like apple pie"),
                SearchCandidate::new("b3", "banana bread"),
            ]
        );
    }

    #[tokio::test]
    async fn results_merge_in_declaration_order_not_completion_order() {
        let mut registry = StrategyRegistry::new(Duration::from_secs(1));
        let mut slow = CountingStrategy::new("Slow", vec![SearchCandidate::new("s", "slow")]);
        slow.delay_ms = 50;
        registry.register(Arc::new(slow));
        registry.register(Arc::new(CountingStrategy::new(
            "Fast",
            vec![SearchCandidate::new("f", "fast")],
        )));

        let merged = registry
            .search_all(&[spec("Slow", &[]), spec("Fast", &[])], "q")
            .await;
        let uids: Vec<_> = merged.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["s", "f"]);
    }

    #[tokio::test]
    async fn failing_custom_script_does_not_hide_default_results() {
        let corpus = MemoryCorpus::with_blocks([("b1", "apple")]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry =
            StrategyRegistry::with_builtins(Arc::new(corpus), Duration::from_secs(5)).with_notices(tx);

        let merged = registry
            .search_all(
                &[spec(CUSTOM_STRATEGY, &["exit 3"]), spec(DEFAULT_STRATEGY, &[])],
                "apple",
            )
            .await;

        assert_eq!(merged, vec![SearchCandidate::new("b1", "apple")]);
        match rx.try_recv().unwrap() {
            ErrorInfo::Strategy { algorithm, message } => {
                assert_eq!(algorithm, CUSTOM_STRATEGY);
                assert!(message.contains("status 3"));
            }
            other => panic!("unexpected notice {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_strategy_is_cut_off_by_timeout() {
        let mut registry = StrategyRegistry::new(Duration::from_millis(20));
        let mut slow = CountingStrategy::new("Slow", vec![SearchCandidate::new("s", "slow")]);
        slow.delay_ms = 500;
        registry.register(Arc::new(slow));

        assert!(registry.run_algorithm("Slow", &[], "q").await.is_empty());
    }

    #[tokio::test]
    async fn unknown_algorithm_yields_nothing() {
        let registry = StrategyRegistry::new(Duration::from_secs(1));
        assert!(registry.run_algorithm("Nope", &[], "q").await.is_empty());
    }

    #[tokio::test]
    async fn default_strategy_errors_are_not_user_notices() {
        struct Broken;
        impl CorpusProvider for Broken {
            fn list_pages(&self) -> BoxFuture<'_, crate::error::Result<Vec<crate::api::types::PageEntry>>> {
                Box::pin(async { Ok(vec![]) })
            }
            fn list_aliases(&self) -> BoxFuture<'_, crate::error::Result<crate::corpus::AliasMap>> {
                Box::pin(async { Ok(Default::default()) })
            }
            fn query_blocks_containing<'a>(
                &'a self,
                _tokens: &'a [String],
            ) -> BoxFuture<'a, crate::error::Result<Vec<(String, String)>>> {
                Box::pin(async {
                    Err(RoamError::Api {
                        status: 500,
                        message: "down".into(),
                    })
                })
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let registry =
            StrategyRegistry::with_builtins(Arc::new(Broken), Duration::from_secs(1)).with_notices(tx);
        assert!(registry.run_algorithm(DEFAULT_STRATEGY, &[], "x").await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn algorithm_uid_is_generated_when_missing() {
        let parsed: SearchAlgorithmSpec = toml::from_str("name = \"Default\"").unwrap();
        assert!(parsed.uid.starts_with("alg-"));
        assert!(parsed.fields.is_empty());
    }

    #[test]
    fn descriptors_expose_builtin_fields() {
        let registry =
            StrategyRegistry::with_builtins(Arc::new(MemoryCorpus::default()), Duration::from_secs(1));
        let descriptors = registry.descriptors();
        assert_eq!(descriptors[0].name, DEFAULT_STRATEGY);
        assert!(descriptors[0].fields.is_empty());
        assert_eq!(descriptors[1].name, CUSTOM_STRATEGY);
        assert_eq!(descriptors[1].fields[0].kind, FieldKind::Script);
        assert_eq!(builtin_descriptors(), descriptors);
    }

    #[test]
    fn script_fields_are_required() {
        let custom = builtin_descriptors().remove(1);
        assert!(custom.check_fields(&[]).unwrap_err().contains("script"));
        assert!(custom.check_fields(&["```sh\n```".into()]).is_err());
        assert!(custom.check_fields(&["echo []".into()]).is_ok());

        let default = builtin_descriptors().remove(0);
        assert!(default.check_fields(&[]).is_ok());
    }
}
