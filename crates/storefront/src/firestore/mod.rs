//! Firestore REST API client.
//!
//! Uses `reqwest` 0.13 against the v1 REST endpoint, authenticated with the
//! project's Web API key. Collection listings are cached using `moka`
//! (1-minute TTL) and invalidated on writes through this client.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::FirebaseConfig;
use types::{ApiErrorResponse, Document, ListDocumentsResponse};

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: &str = "100";

/// Errors from the Firestore REST API.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("Firestore error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Firestore.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The configured project produced an invalid endpoint URL.
    #[error("Invalid Firestore URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    documents_url: Url,
    api_key: SecretString,
    listings: Cache<String, Arc<Vec<Document>>>,
}

impl FirestoreClient {
    /// Create a client for the configured project and database.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Url` if the project or database id cannot
    /// form a valid URL.
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirestoreError> {
        Self::with_base_url(config, FIRESTORE_API_BASE)
    }

    /// Create a client against a different API host (e.g. the emulator).
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Url` if `base_url` is not a valid URL.
    pub fn with_base_url(config: &FirebaseConfig, base_url: &str) -> Result<Self, FirestoreError> {
        let mut documents_url = Url::parse(base_url)?;
        documents_url
            .path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend([
                "projects",
                config.project_id.as_str(),
                "databases",
                config.database_id.as_str(),
                "documents",
            ]);

        let listings = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(60))
            .build();

        Ok(Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                documents_url,
                api_key: config.api_key.clone(),
                listings,
            }),
        })
    }

    /// URL of a document or collection, with the API key attached.
    fn url(&self, path: &[&str]) -> Url {
        let mut url = self.inner.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path);
        }
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        url
    }

    /// Fetch a single document. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_document(&self, path: &[&str]) -> Result<Option<Document>, FirestoreError> {
        let url = self.url(path);
        match self.send(self.inner.client.get(url)).await {
            Ok(doc) => Ok(Some(doc)),
            Err(FirestoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List every document of a collection, following page tokens.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_documents(
        &self,
        collection: &[&str],
    ) -> Result<Arc<Vec<Document>>, FirestoreError> {
        let cache_key = collection.join("/");
        if let Some(cached) = self.inner.listings.get(&cache_key).await {
            debug!(collection = %cache_key, "Cache hit for collection listing");
            return Ok(cached);
        }

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url(collection);
            url.query_pairs_mut().append_pair("pageSize", LIST_PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: ListDocumentsResponse = self.send(self.inner.client.get(url)).await?;
            documents.extend(page.documents);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        let documents = Arc::new(documents);
        self.inner
            .listings
            .insert(cache_key, documents.clone())
            .await;
        Ok(documents)
    }

    /// Create a document with a server-assigned id in `collection`.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if the request fails.
    #[instrument(skip(self, fields))]
    pub async fn create_document(
        &self,
        collection: &[&str],
        fields: Map<String, Value>,
    ) -> Result<Document, FirestoreError> {
        let url = self.url(collection);
        let request = self
            .inner
            .client
            .post(url)
            .json(&Document::with_fields(fields));
        let created = self.send(request).await?;
        self.inner.listings.invalidate(&collection.join("/")).await;
        Ok(created)
    }

    /// Overwrite the given fields of an existing document.
    ///
    /// Only fields named in `fields` are touched; the document must exist.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::NotFound` if the document does not exist.
    #[instrument(skip(self, fields))]
    pub async fn update_document(
        &self,
        path: &[&str],
        fields: Map<String, Value>,
    ) -> Result<Document, FirestoreError> {
        let mut url = self.url(path);
        {
            let mut query = url.query_pairs_mut();
            for field in fields.keys() {
                query.append_pair("updateMask.fieldPaths", field);
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let request = self
            .inner
            .client
            .patch(url)
            .json(&Document::with_fields(fields));
        let updated = self.send(request).await?;
        if let Some((_, collection)) = path.split_last() {
            self.inner.listings.invalidate(&collection.join("/")).await;
        }
        Ok(updated)
    }

    /// Send a request and decode the JSON response.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FirestoreError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(FirestoreError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body).map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |e| format!("{} {}", e.error.status, e.error.message),
            );
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FirestoreError::NotFound(message));
            }
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Firestore returned non-success status"
            );
            return Err(FirestoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Firestore response"
            );
            FirestoreError::Parse(e)
        })
    }
}
