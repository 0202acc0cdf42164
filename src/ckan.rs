//! Remote open-data catalog client.
//!
//! Thin wrapper over the catalog's HTTP action API, covering the three
//! operations the sync tasks need: `search` (datastore_search), `upsert`
//! (datastore_upsert) and `upload` (resource_update with a file part).
//! The catalog's own semantics stay out of scope; this is an opaque
//! collaborator configured entirely through explicit parameters.
//!
//! Transient transport failures are retried with the shared exponential
//! backoff strategy.

use std::path::Path;

use log::debug;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tokio_retry::Retry;
use url::Url;

use crate::config::RETRY_MAX_ATTEMPTS;
use crate::error_handling::{get_retry_strategy, CkanError};

/// Client for one remote catalog endpoint.
#[derive(Debug, Clone)]
pub struct CkanClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl CkanClient {
    /// Creates a client for the catalog at `base_url`, authenticating every
    /// call with `api_key`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, CkanError> {
        Ok(CkanClient {
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
            http: reqwest::Client::builder().build()?,
        })
    }

    /// Full URL for a catalog action.
    fn action_url(&self, action: &str) -> String {
        format!(
            "{}/api/3/action/{}",
            self.base_url.as_str().trim_end_matches('/'),
            action
        )
    }

    /// Searches a datastore resource, returning the matching records.
    pub async fn search(
        &self,
        resource_id: &str,
        filters: &Value,
        limit: u32,
    ) -> Result<Vec<Value>, CkanError> {
        let payload = json!({
            "resource_id": resource_id,
            "filters": filters,
            "limit": limit,
        });
        let result = self.action("datastore_search", &payload).await?;
        Ok(result
            .get("records")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Upserts records into a datastore resource.
    pub async fn upsert(&self, resource_id: &str, records: &[Value]) -> Result<(), CkanError> {
        let payload = json!({
            "resource_id": resource_id,
            "records": records,
            "method": "upsert",
            "force": true,
        });
        self.action("datastore_upsert", &payload).await?;
        Ok(())
    }

    /// Uploads a local file as the new content of a catalog resource.
    pub async fn upload(&self, resource_id: &str, file_path: &Path) -> Result<(), CkanError> {
        let data = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());

        let url = self.action_url("resource_update");
        debug!("uploading {} ({} bytes) to {url}", file_name, data.len());

        let response = Retry::spawn(get_retry_strategy().take(RETRY_MAX_ATTEMPTS), || {
            let form = Form::new().text("id", resource_id.to_string()).part(
                "upload",
                Part::bytes(data.clone()).file_name(file_name.clone()),
            );
            let request = self
                .http
                .post(&url)
                .header("Authorization", &self.api_key)
                .multipart(form);
            async move { request.send().await?.error_for_status() }
        })
        .await?;

        let body: Value = response.json().await?;
        ensure_success("resource_update", &body)?;
        Ok(())
    }

    /// Posts one JSON action payload and returns the `result` document.
    async fn action(&self, action: &str, payload: &Value) -> Result<Value, CkanError> {
        let url = self.action_url(action);
        debug!("calling catalog action {action}");

        let response = Retry::spawn(get_retry_strategy().take(RETRY_MAX_ATTEMPTS), || {
            let request = self
                .http
                .post(&url)
                .header("Authorization", &self.api_key)
                .json(payload);
            async move { request.send().await?.error_for_status() }
        })
        .await?;

        let body: Value = response.json().await?;
        ensure_success(action, &body)?;
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

/// The action API answers 200 even for logical failures; the `success`
/// flag is the authoritative outcome.
fn ensure_success(action: &str, body: &Value) -> Result<(), CkanError> {
    if body.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(());
    }
    Err(CkanError::Api {
        action: action.to_string(),
        message: body
            .get("error")
            .map(Value::to_string)
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}
