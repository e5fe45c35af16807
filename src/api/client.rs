use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::types::{PullRequest, PullResponse, QueryRequest, QueryResponse, WriteAction};
use crate::error::{Result, RoamError};

#[derive(Clone)]
pub struct RoamClient {
    client: Client,
    base_url: String,
    token: String,
}

impl RoamClient {
    pub fn new(graph_name: &str, token: &str) -> Self {
        Self::new_with_base_url(
            &format!("https://api.roamresearch.com/api/graph/{}", graph_name),
            token,
        )
    }

    pub fn new_with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub async fn pull(&self, eid: serde_json::Value, selector: &str) -> Result<PullResponse> {
        let req = PullRequest {
            eid,
            selector: selector.to_string(),
        };
        self.post_json("pull", &req).await
    }

    pub async fn query(
        &self,
        query: String,
        args: Vec<serde_json::Value>,
    ) -> Result<QueryResponse> {
        tracing::debug!(%query, "roam query");
        let req = QueryRequest { query, args };
        self.post_json("q", &req).await
    }

    pub async fn write(&self, action: WriteAction) -> Result<()> {
        self.send("write", &action).await?;
        Ok(())
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self.send(endpoint, body).await?;
        let body = resp.json::<T>().await?;
        Ok(body)
    }

    async fn send<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .header("X-Authorization", format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status, "roam api call failed");
            return Err(RoamError::Api { status, message });
        }

        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::BlockUpdate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, RoamClient) {
        let server = MockServer::start().await;
        let client = RoamClient::new_with_base_url(&server.uri(), "test-token");
        (server, client)
    }

    #[tokio::test]
    async fn pull_sends_correct_request() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/pull"))
            .and(header("X-Authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": {":node/title": "Today"}})),
            )
            .mount(&server)
            .await;

        let resp = client
            .pull(json!("[:block/uid \"x\"]"), "[:node/title]")
            .await
            .unwrap();

        assert_eq!(resp.result[":node/title"], "Today");
    }

    #[tokio::test]
    async fn query_sends_args() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/q"))
            .and(body_partial_json(json!({"args": [["apple"]]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [["b1", "I like apple pie"]]
            })))
            .mount(&server)
            .await;

        let resp = client
            .query("[:find ?uid ?s :in $ [?token ...]]".into(), vec![json!(["apple"])])
            .await
            .unwrap();

        assert_eq!(resp.result.len(), 1);
        assert_eq!(resp.result[0][0], "b1");
    }

    #[tokio::test]
    async fn write_sends_update() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/write"))
            .and(body_partial_json(json!({"action": "update-block"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = client
            .write(WriteAction::UpdateBlock {
                block: BlockUpdate {
                    uid: "abc".into(),
                    string: "Updated".into(),
                },
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn failed_status_becomes_api_error() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/q"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client.query("[:find ?b]".into(), vec![]).await.unwrap_err();
        match err {
            RoamError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("Expected Api error, got: {:?}", other),
        }
    }
}
