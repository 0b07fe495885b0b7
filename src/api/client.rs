//! HTTP client for the monitoring backend
//!
//! One method per backend resource. Nothing is cached: every call re-fetches. GET calls are
//! safe to repeat; `run_action` is not and is never retried here.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{instrument, trace};

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};

use super::types::{
    Action, ActionCatalog, ActionResult, Analysis, ChatBody, ChatReply, ChatRequest,
    DockerOverview, ErrorBody, HistorySample, HistorySeries, Host, HostEntry, Process, ProcessList,
    Snapshot, SuggestionReport, hosts_from_map,
};

/// Operations offered by the backend
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// `GET /servers`
    async fn hosts(&self) -> ConsoleResult<Vec<Host>>;

    /// `GET /metrics/{host}`
    async fn metrics(&self, host: &str) -> ConsoleResult<Snapshot>;

    /// `GET /processes/{host}`
    async fn processes(&self, host: &str) -> ConsoleResult<Vec<Process>>;

    /// `GET /docker/{host}`
    async fn docker(&self, host: &str) -> ConsoleResult<DockerOverview>;

    /// `GET /history/{host}?hours=N`, oldest sample first
    async fn history(&self, host: &str, hours: u32) -> ConsoleResult<Vec<HistorySample>>;

    /// `GET /analyze/{host}`
    async fn analyze(&self, host: &str) -> ConsoleResult<Analysis>;

    /// `GET /suggestions/{host}`
    async fn suggestions(&self, host: &str) -> ConsoleResult<SuggestionReport>;

    /// `GET /actions`
    async fn actions(&self) -> ConsoleResult<Vec<Action>>;

    /// `POST /actions/{host}/{action}`
    async fn run_action(&self, host: &str, action_id: &str) -> ConsoleResult<ActionResult>;

    /// `POST /chat/{host}`
    async fn ask(&self, host: &str, question: &str) -> ConsoleResult<ChatReply>;
}

/// [`ConsoleApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    /// Base URL including the `/api` prefix, without trailing slash
    base_url: String,

    /// Bearer token (optional)
    api_token: Option<String>,

    /// HTTP client (reused across requests)
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| ConsoleError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: format!("{}/api", config.api_url.trim_end_matches('/')),
            api_token: config.api_token.clone(),
            client,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        let url = format!("{}{}", self.base_url, path);
        trace!("GET {url}");

        let response = self.authorize(self.client.get(&url)).send().await?;
        read_json(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ConsoleResult<T> {
        let url = format!("{}{}", self.base_url, path);
        trace!("POST {url}");

        let mut request = self.authorize(self.client.post(&url));
        request = match body {
            Some(body) => request.json(body),
            None => request.header("Content-Type", "application/json"),
        };

        let response = request.send().await?;
        read_json(response).await
    }
}

/// Turn a response into `T`, mapping non-success codes to [`ConsoleError::Response`]
async fn read_json<T: DeserializeOwned>(response: Response) -> ConsoleResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(response_error(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

fn response_error(status: StatusCode, body: &str) -> ConsoleError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    ConsoleError::Response {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ConsoleApi for HttpApiClient {
    #[instrument(skip(self))]
    async fn hosts(&self) -> ConsoleResult<Vec<Host>> {
        let map: BTreeMap<String, HostEntry> = self.get("/servers").await?;
        Ok(hosts_from_map(map))
    }

    #[instrument(skip(self))]
    async fn metrics(&self, host: &str) -> ConsoleResult<Snapshot> {
        self.get(&format!("/metrics/{host}")).await
    }

    #[instrument(skip(self))]
    async fn processes(&self, host: &str) -> ConsoleResult<Vec<Process>> {
        let list: ProcessList = self.get(&format!("/processes/{host}")).await?;
        Ok(list.processes)
    }

    #[instrument(skip(self))]
    async fn docker(&self, host: &str) -> ConsoleResult<DockerOverview> {
        self.get(&format!("/docker/{host}")).await
    }

    #[instrument(skip(self))]
    async fn history(&self, host: &str, hours: u32) -> ConsoleResult<Vec<HistorySample>> {
        let series: HistorySeries = self.get(&format!("/history/{host}?hours={hours}")).await?;
        Ok(series.history)
    }

    #[instrument(skip(self))]
    async fn analyze(&self, host: &str) -> ConsoleResult<Analysis> {
        self.get(&format!("/analyze/{host}")).await
    }

    #[instrument(skip(self))]
    async fn suggestions(&self, host: &str) -> ConsoleResult<SuggestionReport> {
        self.get(&format!("/suggestions/{host}")).await
    }

    #[instrument(skip(self))]
    async fn actions(&self) -> ConsoleResult<Vec<Action>> {
        let catalog: ActionCatalog = self.get("/actions").await?;
        Ok(catalog.actions)
    }

    #[instrument(skip(self))]
    async fn run_action(&self, host: &str, action_id: &str) -> ConsoleResult<ActionResult> {
        self.post(&format!("/actions/{host}/{action_id}"), None).await
    }

    #[instrument(skip(self, question))]
    async fn ask(&self, host: &str, question: &str) -> ConsoleResult<ChatReply> {
        let body = serde_json::to_value(ChatRequest { question })?;
        let reply: ChatBody = self.post(&format!("/chat/{host}"), Some(&body)).await?;
        Ok(ChatReply::from_body(reply))
    }
}
