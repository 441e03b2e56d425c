//! Thin typed client for the search engine's administrative API.
//!
//! One method per operation the migration engine consumes. Transport
//! failures map to [`GriddleError::Http`], unexpected statuses to
//! [`GriddleError::Engine`], and body decode failures to
//! [`GriddleError::Decode`]; statuses with protocol meaning (404 on delete,
//! the create-race 400) are surfaced as outcome enums instead of errors.

use std::collections::HashMap;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::error::{GriddleError, Result};

pub mod types;

use types::{
    AliasActionsRequest, BlockResponse, EngineErrorResponse, IndexInfo, ReindexRequest,
    SettingsResponse, TaskCreationResponse, TaskStatus,
};

/// Catalog selector matching every index.
const ALL_INDICES: &str = "_all";
/// System index where the engine keeps finished task documents.
const TASK_INDEX: &str = ".tasks";
/// Error type the engine returns when an index was created concurrently.
const RESOURCE_ALREADY_EXISTS: &str = "resource_already_exists_exception";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateIndexOutcome {
    Created,
    /// Another instance created the index first. Treated as success.
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteIndexOutcome {
    Deleted,
    /// The index was already gone. Treated as success.
    NotFound,
}

pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Fetch the full index catalog: index name to mapping metadata.
    pub async fn list_indices(
        &self,
        token: &CancellationToken,
    ) -> Result<HashMap<String, IndexInfo>> {
        let context = "fetching index catalog";
        let res = self
            .send(token, self.http.get(self.url(ALL_INDICES)), context)
            .await?;
        let res = require_success(res, context)?;
        decode(res, context).await
    }

    /// Whether the index currently rejects writes.
    pub async fn get_write_block(&self, token: &CancellationToken, index: &str) -> Result<bool> {
        let context = "checking if write block is enabled on index";
        let res = self
            .send(
                token,
                self.http.get(self.url(&format!("{}/_settings", index))),
                context,
            )
            .await?;
        let res = require_success(res, context)?;
        let settings: HashMap<String, SettingsResponse> =
            decode(res, "settings response").await?;

        Ok(settings
            .get(index)
            .map(SettingsResponse::write_blocked)
            .unwrap_or(false))
    }

    /// Ask the engine to reject further writes to the index.
    pub async fn add_write_block(
        &self,
        token: &CancellationToken,
        index: &str,
    ) -> Result<BlockResponse> {
        let context = "placing write block on index";
        let res = self
            .send(
                token,
                self.http.put(self.url(&format!("{}/_block/write", index))),
                context,
            )
            .await?;
        let res = require_success(res, context)?;
        decode(res, "write block response").await
    }

    /// `HEAD` probe: 200 means the index exists, 404 means it doesn't.
    pub async fn index_exists(&self, token: &CancellationToken, index: &str) -> Result<bool> {
        let context = "checking if index exists";
        let res = self
            .send(token, self.http.head(self.url(index)), context)
            .await?;

        match res.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(GriddleError::Engine {
                status: s.as_u16(),
                context: context.into(),
            }),
        }
    }

    /// Create an index from the given body (`mappings`, optional `settings`
    /// and `aliases`). A concurrent creation by another instance is reported
    /// as [`CreateIndexOutcome::AlreadyExists`], not an error.
    pub async fn create_index(
        &self,
        token: &CancellationToken,
        index: &str,
        body: &serde_json::Value,
    ) -> Result<CreateIndexOutcome> {
        let context = "creating index";
        let res = self
            .send(token, self.http.put(self.url(index)).json(body), context)
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(CreateIndexOutcome::Created);
        }

        if status == StatusCode::BAD_REQUEST {
            let error: EngineErrorResponse = decode(res, "engine error response").await?;
            if error.error.type_.as_deref() == Some(RESOURCE_ALREADY_EXISTS) {
                return Ok(CreateIndexOutcome::AlreadyExists);
            }
        }

        Err(GriddleError::Engine {
            status: status.as_u16(),
            context: context.into(),
        })
    }

    /// Delete an index. 404 is reported as
    /// [`DeleteIndexOutcome::NotFound`], not an error.
    pub async fn delete_index(
        &self,
        token: &CancellationToken,
        index: &str,
    ) -> Result<DeleteIndexOutcome> {
        let context = "deleting index";
        let res = self
            .send(token, self.http.delete(self.url(index)), context)
            .await?;

        match res.status() {
            s if s.is_success() => Ok(DeleteIndexOutcome::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteIndexOutcome::NotFound),
            s => Err(GriddleError::Engine {
                status: s.as_u16(),
                context: context.into(),
            }),
        }
    }

    /// Submit an asynchronous copy job from `source` to `dest` and return
    /// the opaque task handle.
    pub async fn start_reindex(
        &self,
        token: &CancellationToken,
        source: &str,
        dest: &str,
    ) -> Result<String> {
        let context = "initiating reindex";
        let res = self
            .send(
                token,
                self.http
                    .post(self.url("_reindex"))
                    .query(&[("wait_for_completion", "false")])
                    .json(&ReindexRequest::new(source, dest)),
                context,
            )
            .await?;
        let res = require_success(res, context)?;
        let created: TaskCreationResponse = decode(res, "reindex response").await?;

        Ok(created.task)
    }

    /// Fetch a task's status by handle; returns whether it has completed.
    pub async fn get_task(&self, token: &CancellationToken, task: &str) -> Result<bool> {
        let context = "getting task status";
        let res = self
            .send(
                token,
                self.http.get(self.url(&format!("_tasks/{}", task))),
                context,
            )
            .await?;
        let res = require_success(res, context)?;
        let status: TaskStatus = decode(res, "task response").await?;

        Ok(status.completed)
    }

    /// Remove the task's tracking document from the engine's task index.
    pub async fn delete_task_doc(&self, token: &CancellationToken, task: &str) -> Result<()> {
        let context = "deleting task document";
        let res = self
            .send(
                token,
                self.http
                    .delete(self.url(&format!("{}/_doc/{}", TASK_INDEX, task))),
                context,
            )
            .await?;
        require_success(res, context)?;

        Ok(())
    }

    /// Apply a batch of alias actions; the engine guarantees readers observe
    /// the whole batch atomically.
    pub async fn update_aliases(
        &self,
        token: &CancellationToken,
        request: &AliasActionsRequest,
    ) -> Result<()> {
        let context = "swapping the alias";
        let res = self
            .send(
                token,
                self.http.post(self.url("_aliases")).json(request),
                context,
            )
            .await?;
        require_success(res, context)?;

        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Issue a request, observing cancellation both before sending and while
    /// the call is in flight.
    async fn send(
        &self,
        token: &CancellationToken,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response> {
        if token.is_cancelled() {
            return Err(GriddleError::Cancelled);
        }

        tokio::select! {
            _ = token.cancelled() => Err(GriddleError::Cancelled),
            res = request.send() => {
                res.map_err(|e| GriddleError::Http(format!("{}: {}", context, e)))
            }
        }
    }
}

fn require_success(res: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(GriddleError::Engine {
            status: res.status().as_u16(),
            context: context.into(),
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(res: reqwest::Response, context: &str) -> Result<T> {
    res.json::<T>()
        .await
        .map_err(|e| GriddleError::Decode(format!("{}: {}", context, e)))
}
