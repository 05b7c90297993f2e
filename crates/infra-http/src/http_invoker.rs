// Remote Model Invoker
// POST {base_url}/{capability_id} with {"args": [...]}, response body is the payload

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use greenearth_core::domain::{InvocationRequest, Payload};
use greenearth_core::port::{ExtractionError, InvocationError, ModelInvoker};

#[derive(Serialize)]
struct InvokeBody<'a> {
    args: &'a [String],
}

/// ModelInvoker backed by a model-serving HTTP endpoint
pub struct HttpModelInvoker {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpModelInvoker {
    /// `timeout` of `None` leaves requests unbounded
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, InvocationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| InvocationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self, request: &InvocationRequest) -> String {
        format!("{}/{}", self.base_url, request.capability().id())
    }
}

#[async_trait]
impl ModelInvoker for HttpModelInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> Result<Payload, InvocationError> {
        let url = self.endpoint(request);
        info!(url = %url, args = ?request.args(), "Invoking remote model");

        let response = self
            .client
            .post(&url)
            .json(&InvokeBody {
                args: request.args(),
            })
            .send()
            .await
            .map_err(|e| match self.timeout {
                Some(limit) if e.is_timeout() => InvocationError::Timeout(limit.as_millis() as u64),
                _ => InvocationError::Transport(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Remote model returned an error");
            return Err(InvocationError::Remote {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| InvocationError::Transport(e.to_string()))?;

        let value = serde_json::from_str(body.trim()).map_err(|source| {
            ExtractionError::InvalidJson {
                line: body.clone(),
                source,
            }
        })?;

        Ok(Payload::new(value))
    }
}
