use std::process::Stdio;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{FieldKind, FieldSpec, SearchCandidate, SearchStrategy, StrategyError, CUSTOM_STRATEGY};

/// Runs a user-authored shell script, which may be wrapped in a ``` fence.
/// The query is passed on stdin and in `ROAM_QUERY`; stdout must be a bare
/// JSON array of `{"uid", "text"}` objects.
#[derive(Debug, Default)]
pub struct CustomStrategy;

impl CustomStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl SearchStrategy for CustomStrategy {
    fn name(&self) -> &str {
        CUSTOM_STRATEGY
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec {
            name: "script",
            kind: FieldKind::Script,
            description: "Shell script reading the query from stdin and printing a JSON array of {uid, text}",
        }]
    }

    fn user_authored(&self) -> bool {
        true
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        params: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<SearchCandidate>, StrategyError>> {
        async move {
            let script = params
                .first()
                .map(|s| strip_code_fence(s.as_str()))
                .filter(|s| !s.is_empty())
                .ok_or(StrategyError::MissingScript)?;
            let stdout = run_script(script, query).await?;
            parse_script_output(&stdout)
        }
        .boxed()
    }
}

async fn run_script(script: &str, query: &str) -> Result<String, StrategyError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(script)
        .env("ROAM_QUERY", query)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(StrategyError::Spawn)?;

    if let Some(mut stdin) = child.stdin.take() {
        // Scripts that ignore stdin may exit before reading it.
        if let Err(e) = stdin.write_all(query.as_bytes()).await {
            tracing::debug!(error = %e, "script closed stdin early");
        }
    }

    let output = child.wait_with_output().await.map_err(StrategyError::Spawn)?;
    if !output.status.success() {
        return Err(StrategyError::Exit {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout)
        .map_err(|_| StrategyError::MalformedOutput("output is not valid UTF-8".into()))
}

/// Removes a surrounding ``` fence (with optional language tag), if present.
pub fn strip_code_fence(source: &str) -> &str {
    let trimmed = source.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.find('\n') {
        Some(nl) => body[nl + 1..].trim(),
        None => body.trim(),
    }
}

pub fn parse_script_output(stdout: &str) -> Result<Vec<SearchCandidate>, StrategyError> {
    let value: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| StrategyError::MalformedOutput(format!("invalid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(StrategyError::MalformedOutput("expected a JSON array".into()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let field = |name: &str| {
                item.get(name)
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or_else(|| {
                        StrategyError::MalformedOutput(format!(
                            "item {} has no string \"{}\"",
                            i, name
                        ))
                    })
            };
            Ok(SearchCandidate {
                uid: field("uid")?,
                text: field("text")?,
            })
        })
        .collect()
}
