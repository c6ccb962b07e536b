//! Elasticsearch backend over HTTPS
//!
//! Uses the REST API directly: `HEAD`/`DELETE`/`PUT /{index}` for the index
//! lifecycle and `POST /_bulk` with an NDJSON body for writes.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Certificate, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::{BulkItem, ClusterInfo, SearchBackend};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::IndexAction;

/// Elasticsearch client
pub struct ElasticsearchBackend {
    client: Client,
    base_url: String,
    username: String,
    password: Option<String>,
}

impl ElasticsearchBackend {
    /// Build a client from backend settings
    ///
    /// The timeout applies to every request, including index resets and
    /// bulk writes.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_certs);

        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path).map_err(|e| {
                Error::Config(format!("cannot read CA certificate {}: {}", path.display(), e))
            })?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                Error::Config(format!("invalid CA certificate {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if !config.verify_certs {
            tracing::warn!("TLS certificate verification disabled for {}", config.url);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, self.password.as_ref())
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| request_error(operation, e))
    }
}

/// Classify a transport failure; deadlines become [`Error::Timeout`]
fn request_error(operation: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("{}: {}", operation, err))
    } else {
        Error::backend(format!("{} failed: {}", operation, err))
    }
}

/// Turn a non-success response into an error carrying status and body
async fn ensure_success(operation: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::backend(format!("{} failed ({}): {}", operation, status, body)))
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .send("index exists", self.client.head(self.url(index)))
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::backend(format!(
                "index exists check for '{}' returned {}",
                index, status
            ))),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let response = self
            .send("delete index", self.client.delete(self.url(index)))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Index '{}' already absent", index);
            return Ok(());
        }
        ensure_success("delete index", response).await?;
        Ok(())
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
        let response = self
            .send("create index", self.client.put(self.url(index)).json(body))
            .await?;
        ensure_success("create index", response).await?;
        Ok(())
    }

    async fn bulk(&self, actions: &[IndexAction]) -> Result<Vec<BulkItem>> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }

        let mut body = Vec::new();
        for action in actions {
            action.write_ndjson(&mut body)?;
        }

        let request = self
            .client
            .post(self.url("_bulk"))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let response = self.send("bulk write", request).await?;
        let response = ensure_success("bulk write", response).await?;

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| request_error("bulk response", e))?;

        if parsed.items.len() != actions.len() {
            return Err(Error::backend(format!(
                "bulk response has {} items for {} actions",
                parsed.items.len(),
                actions.len()
            )));
        }

        Ok(parsed
            .items
            .into_iter()
            .zip(actions)
            .map(|(mut item, action)| {
                let result = item.remove("index").unwrap_or_default();
                let id = result.id.unwrap_or_else(|| action.id.clone());
                match result.error {
                    Some(error) => BulkItem::rejected(id, result.status, error.kind, error.reason),
                    None => BulkItem::ok(id, result.status),
                }
            })
            .collect())
    }

    async fn count(&self, index: &str) -> Result<u64> {
        let refresh = self
            .send("refresh", self.client.post(self.url(&format!("{}/_refresh", index))))
            .await?;
        ensure_success("refresh", refresh).await?;

        let response = self
            .send("count", self.client.get(self.url(&format!("{}/_count", index))))
            .await?;
        let response = ensure_success("count", response).await?;
        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| request_error("count response", e))?;
        Ok(parsed.count)
    }

    async fn info(&self) -> Result<ClusterInfo> {
        let response = self.send("cluster info", self.client.get(self.url(""))).await?;
        let response = ensure_success("cluster info", response).await?;
        let parsed: InfoResponse = response
            .json()
            .await
            .map_err(|e| request_error("cluster info response", e))?;
        Ok(ClusterInfo {
            name: parsed.name,
            cluster_name: parsed.cluster_name,
            version: parsed.version.number,
        })
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}

// Elasticsearch API types

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemResponse>>,
}

#[derive(Debug, Default, Deserialize)]
struct BulkItemResponse {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(default)]
    status: u16,
    error: Option<BulkErrorCause>,
}

#[derive(Debug, Deserialize)]
struct BulkErrorCause {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    version: VersionInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    number: String,
}
