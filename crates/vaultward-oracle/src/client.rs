//! HTTP implementation of the decision-oracle seam.

use crate::protocol::{parse_reply, parse_summary};
use crate::{schema, DecisionOracle, DecisionRequest, OracleError, OracleReply, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use vaultward_types::ToolOutcome;

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

/// Talks to the decision service over its responses endpoint.
pub struct HttpDecisionOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpDecisionOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn post(&self, body: &Value) -> Result<String> {
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|error| OracleError::Transport(error.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| OracleError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(OracleError::Protocol {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl DecisionOracle for HttpDecisionOracle {
    async fn decide(&self, request: &DecisionRequest) -> Result<OracleReply> {
        let payload = json!({
            "signals": request.signals,
            "context": request.context,
        });
        let payload_text = serde_json::to_string(&payload)
            .map_err(|error| OracleError::Malformed(error.to_string()))?;
        let body = json!({
            "model": self.config.model,
            "input": [
                {"role": "system", "content": request.rules},
                {"role": "user", "content": payload_text},
            ],
            "tools": schema::vault_tools(),
            "tool_choice": "auto",
            // one sequential batch at most; keeps gate validation linear
            "parallel_tool_calls": false,
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "decision",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "properties": {
                            "action": {"type": "string"},
                            "rationale": {"type": "string"},
                        },
                        "required": ["action", "rationale"],
                        "additionalProperties": false,
                    },
                },
            },
        });
        debug!(model = %self.config.model, "decision turn");
        let text = self.post(&body).await?;
        parse_reply(&text)
    }

    async fn explain(
        &self,
        previous_response_id: &str,
        outcomes: &[ToolOutcome],
    ) -> Result<String> {
        let input: Vec<Value> = outcomes
            .iter()
            .map(|outcome| {
                json!({
                    "type": "function_call_output",
                    "call_id": outcome.call_id,
                    "output": outcome.output,
                })
            })
            .collect();
        let body = json!({
            "model": self.config.model,
            "previous_response_id": previous_response_id,
            "input": input,
        });
        debug!(previous_response_id, "explanation turn");
        let text = self.post(&body).await?;
        parse_summary(&text)
    }
}
