//! Low-level REST client for the cloud document store

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::CloudConfig;
use crate::error::{CoreError, Result};
use super::value::{Document, FieldValue};

/// REST client for one project's document tree.
///
/// Paths are given relative to the project documents root, for example
/// `quejas/Baches/quejasList`. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    http: reqwest::Client,
    documents_root: String,
}

impl DocumentClient {
    /// Build a client for the configured project
    pub fn new(config: &CloudConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            documents_root: config.documents_root(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.documents_root, path)
    }

    /// Create a document with a server-assigned id in the given collection
    pub async fn create_document(
        &self,
        collection_path: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<Document> {
        let response = self
            .http
            .post(self.url(collection_path))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Create or overwrite the document at a known path
    pub async fn set_document(
        &self,
        doc_path: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<Document> {
        let response = self
            .http
            .patch(self.url(doc_path))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Fetch one document; `Ok(None)` when it does not exist
    pub async fn get_document(&self, doc_path: &str) -> Result<Option<Document>> {
        let response = self.http.get(self.url(doc_path)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read_json(response).await?))
    }

    /// List every document in a collection, following pagination.
    /// A collection that was never written yields an empty list.
    pub async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.url(collection_path))
                .query(&[("pageSize", "300")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let page: ListResponse = Self::read_json(response).await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Atomically overwrite a single field of a document
    pub async fn patch_field(
        &self,
        doc_path: &str,
        field: &str,
        value: FieldValue,
    ) -> Result<Document> {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), value);

        let response = self
            .http
            .patch(self.url(doc_path))
            .query(&[("updateMask.fieldPaths", field)])
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Delete the document at the given path
    pub async fn delete_document(&self, doc_path: &str) -> Result<()> {
        let response = self.http.delete(self.url(doc_path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(CoreError::RemoteError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Run an equality-filtered query over one sub-collection of a document
    pub async fn query_equal(
        &self,
        parent_path: &str,
        collection_id: &str,
        field: &str,
        value: FieldValue,
    ) -> Result<Vec<Document>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": value,
                    }
                }
            }
        });

        let response = self
            .http
            .post(format!("{}:runQuery", self.url(parent_path)))
            .json(&body)
            .send()
            .await?;
        let entries: Vec<RunQueryEntry> = Self::read_json(response).await?;
        Ok(entries.into_iter().filter_map(|entry| entry.document).collect())
    }

    /// Check the status, then decode; backend error text travels verbatim
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(CoreError::RemoteError {
                status: status.as_u16(),
                message,
            });
        }
        response.json().await.map_err(Into::into)
    }

    /// Pull the backend's message out of the error body, falling back to
    /// the raw response text
    async fn error_message(response: reqwest::Response) -> String {
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error.message,
            Err(_) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
