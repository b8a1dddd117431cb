//! HTTP client for a DynamoDB-compatible endpoint.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cflogs_core::config::StoreConfig;
use cflogs_core::{NormalizedRecord, RecordStore, StoreError};
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::item::PutItemRequest;

const CONTENT_TYPE_AMZ_JSON: &str = "application/x-amz-json-1.0";
const PUT_ITEM_TARGET: &str = "DynamoDB_20120810.PutItem";

/// Pooled `PutItem` client. Build once and share: the underlying connection
/// pool lives as long as the client.
#[derive(Clone)]
pub struct DynamoClient {
    client: Client<HttpConnector, Full<Bytes>>,
    endpoint: Uri,
    timeout: Duration,
}

impl DynamoClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, StoreError> {
        let endpoint = endpoint
            .parse::<Uri>()
            .map_err(|err| StoreError::Http(format!("invalid endpoint {endpoint:?}: {err}")))?;
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::new(&config.endpoint, config.request_timeout())
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Unconditional `PutItem`: no condition expression, existing items with
    /// the same key are overwritten.
    pub async fn put_item(&self, table: &str, record: &NormalizedRecord) -> Result<(), StoreError> {
        let body = serde_json::to_vec(&PutItemRequest::new(table, record))?;
        let request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_AMZ_JSON)
            .header("x-amz-target", PUT_ITEM_TARGET)
            .body(Full::new(Bytes::from(body)))
            .map_err(|err| StoreError::Http(err.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| StoreError::Http(format!("request timed out after {:?}", self.timeout)))?
            .map_err(|err| StoreError::Http(err.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| StoreError::Http(err.to_string()))?
            .to_bytes();

        if status.is_success() {
            tracing::debug!(table, status = status.as_u16(), "put item accepted");
            return Ok(());
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            message: service_error_message(&body),
        })
    }
}

impl std::fmt::Debug for DynamoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for DynamoClient {
    async fn put(&self, table: &str, record: &NormalizedRecord) -> Result<(), StoreError> {
        self.put_item(table, record).await
    }
}

/// Render a DynamoDB error body (`{"__type": "ns#Name", "message": ".."}`)
/// as `Name: message`, falling back to the raw body text.
fn service_error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ServiceError {
        #[serde(rename = "__type")]
        kind: Option<String>,
        #[serde(alias = "Message")]
        message: Option<String>,
    }

    match serde_json::from_slice::<ServiceError>(body) {
        Ok(ServiceError { kind, message }) if kind.is_some() || message.is_some() => {
            let kind = kind
                .as_deref()
                .map(|k| k.rsplit('#').next().unwrap_or(k))
                .unwrap_or("UnknownError");
            match message {
                Some(message) => format!("{kind}: {message}"),
                None => kind.to_string(),
            }
        }
        _ => String::from_utf8_lossy(body).trim().to_string(),
    }
}
