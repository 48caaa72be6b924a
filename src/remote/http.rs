use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{TimelineError, TimelineResult};

use super::graphql::{GraphQlRequest, GraphQlResponse, GraphQlTransport};

pub const DEFAULT_ENDPOINT: &str = "https://api.monday.com/v2";

/// GraphQL over HTTPS with a bearer-style API token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> TimelineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TimelineError::Remote(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn with_default_endpoint(token: impl Into<String>) -> TimelineResult<Self> {
        Self::new(DEFAULT_ENDPOINT, token)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify_status(status: StatusCode, body: &str) -> TimelineError {
    let message = format!("http {status}: {body}");
    match status {
        StatusCode::TOO_MANY_REQUESTS => TimelineError::RateLimited {
            attempts: 1,
            message,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TimelineError::Authorization(message),
        _ => TimelineError::Remote(message),
    }
}

impl GraphQlTransport for HttpTransport {
    async fn execute(&self, request: &GraphQlRequest) -> TimelineResult<GraphQlResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| TimelineError::Remote(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "graphql endpoint returned an error status");
            return Err(classify_status(status, &body));
        }

        debug!(%status, "graphql response received");
        response
            .json()
            .await
            .map_err(|e| TimelineError::InvalidData(format!("failed to parse response: {e}")))
    }
}
