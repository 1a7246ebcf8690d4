//! Qdrant vector store over the REST API.

use super::{ScoredPoint, SearchQuery, VectorPayload, VectorRecord, VectorStore};
use crate::config::{RetrySettings, VectorStoreSettings};
use crate::error::{NotewiseError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Payload key the content filter is applied to.
const CONTENT_ID_KEY: &str = "contentId";

/// Vector store backed by a Qdrant collection.
pub struct QdrantVectorStore {
    client: Client,
    base: Url,
    collection: String,
    retry: RetryPolicy,
}

impl QdrantVectorStore {
    /// Build a client for the configured Qdrant instance.
    pub fn new(settings: &VectorStoreSettings, retry: &RetrySettings) -> Result<Self> {
        let base = Url::parse(&settings.url)
            .map_err(|e| NotewiseError::Config(format!("Invalid Qdrant URL {}: {}", settings.url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(NotewiseError::Config(
                "Qdrant URL must be an http(s) URL".to_string(),
            ));
        }
        if settings.collection.trim().is_empty() {
            return Err(NotewiseError::Config("Missing Qdrant collection name".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key.trim())
                    .map_err(|_| NotewiseError::Config("Invalid Qdrant API key".to_string()))?,
            );
        }

        let retry = RetryPolicy::from_settings(retry);
        let client = Client::builder()
            .timeout(retry.call_timeout + Duration::from_secs(5))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            collection: settings.collection.clone(),
            retry,
        })
    }

    fn endpoint(&self, suffix: &str) -> Result<Url> {
        let path = format!(
            "{}/collections/{}{}",
            self.base.path().trim_end_matches('/'),
            self.collection,
            suffix
        );
        let mut url = self.base.clone();
        url.set_path(&path);
        Ok(url)
    }

    /// Send one request, retrying transient failures, and return the JSON body.
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        self.retry
            .run("qdrant request", || {
                let mut request = self.client.request(method.clone(), url.clone());
                if let Some(body) = body {
                    request = request.json(body);
                }
                async move {
                    let response = request.send().await?;
                    let status = response.status();
                    let text = response.text().await?;
                    if !status.is_success() {
                        return Err(NotewiseError::from_status(status, &text, NotewiseError::VectorStore));
                    }
                    if text.trim().is_empty() {
                        return Ok(Value::Null);
                    }
                    Ok(serde_json::from_str(&text)?)
                }
            })
            .await
    }

    /// Create the collection and its content-id index if they do not exist yet.
    #[instrument(skip(self))]
    pub async fn ensure_collection(&self, dimensions: usize) -> Result<()> {
        let url = self.endpoint("")?;
        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            status if status.is_success() => {
                debug!("Qdrant collection {} exists", self.collection);
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                info!("Creating Qdrant collection {} ({} dims)", self.collection, dimensions);
                self.send(Method::PUT, url, Some(&create_collection_body(dimensions)))
                    .await?;
                self.send(
                    Method::PUT,
                    self.endpoint("/index")?,
                    Some(&json!({ "field_name": CONTENT_ID_KEY, "field_schema": "integer" })),
                )
                .await?;
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(NotewiseError::from_status(status, &body, NotewiseError::VectorStore))
            }
        }
    }
}

fn create_collection_body(dimensions: usize) -> Value {
    json!({ "vectors": { "size": dimensions, "distance": "Cosine" } })
}

fn content_filter(content_id: i64) -> Value {
    json!({ "must": [ { "key": CONTENT_ID_KEY, "match": { "value": content_id } } ] })
}

#[derive(Serialize)]
struct PointStruct<'a> {
    id: u64,
    vector: &'a [f32],
    payload: &'a VectorPayload,
}

fn upsert_body(records: &[VectorRecord]) -> Result<Value> {
    let points: Vec<PointStruct<'_>> = records
        .iter()
        .map(|r| PointStruct {
            id: r.id,
            vector: &r.vector,
            payload: &r.payload,
        })
        .collect();
    Ok(json!({ "points": serde_json::to_value(points)? }))
}

fn search_body(query: &SearchQuery) -> Value {
    let mut body = json!({
        "vector": query.vector,
        "limit": query.limit,
        "with_payload": true,
        "filter": content_filter(query.content_id),
    });
    if let Some(threshold) = query.score_threshold {
        body["score_threshold"] = json!(threshold);
    }
    body
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<RawScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct RawScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<VectorPayload>,
}

fn parse_search_response(body: Value) -> Result<Vec<ScoredPoint>> {
    let response: SearchResponse = serde_json::from_value(body)?;
    Ok(response
        .result
        .into_iter()
        .filter_map(|p| {
            let id = p.id.as_u64()?;
            let payload = p.payload?;
            Some(ScoredPoint {
                id,
                score: p.score,
                payload,
            })
        })
        .collect())
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut url = self.endpoint("/points")?;
        url.set_query(Some("wait=true"));
        self.send(Method::PUT, url, Some(&upsert_body(records)?))
            .await
            .map_err(into_store_error)?;
        Ok(())
    }

    #[instrument(skip(self, query), fields(content_id = query.content_id, limit = query.limit))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ScoredPoint>> {
        let body = self
            .send(Method::POST, self.endpoint("/points/search")?, Some(&search_body(query)))
            .await
            .map_err(into_store_error)?;
        parse_search_response(body)
    }

    #[instrument(skip(self))]
    async fn delete_content(&self, content_id: i64) -> Result<()> {
        let mut url = self.endpoint("/points/delete")?;
        url.set_query(Some("wait=true"));
        self.send(
            Method::POST,
            url,
            Some(&json!({ "filter": content_filter(content_id) })),
        )
        .await
        .map_err(into_store_error)?;
        Ok(())
    }
}

/// Keep auth and availability kinds; everything else is a store error.
fn into_store_error(err: NotewiseError) -> NotewiseError {
    match err {
        NotewiseError::Unauthorized(_)
        | NotewiseError::ServerUnavailable(_)
        | NotewiseError::Timeout(_)
        | NotewiseError::VectorStore(_) => err,
        other => NotewiseError::VectorStore(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> QdrantVectorStore {
        let settings = VectorStoreSettings {
            url: "http://localhost:6333/".to_string(),
            collection: "segments".to_string(),
            ..Default::default()
        };
        QdrantVectorStore::new(&settings, &RetrySettings::default()).unwrap()
    }

    #[test]
    fn test_endpoints() {
        let store = store();
        assert_eq!(
            store.endpoint("/points/search").unwrap().as_str(),
            "http://localhost:6333/collections/segments/points/search"
        );
        assert_eq!(
            store.endpoint("").unwrap().as_str(),
            "http://localhost:6333/collections/segments"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        let settings = VectorStoreSettings {
            url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(QdrantVectorStore::new(&settings, &RetrySettings::default()).is_err());
    }

    #[test]
    fn test_search_body_uses_must_filter() {
        let body = search_body(&SearchQuery {
            vector: vec![0.5, 0.5],
            content_id: 42,
            limit: 5,
            score_threshold: Some(0.3),
        });

        assert_eq!(body["filter"]["must"][0]["key"], "contentId");
        assert_eq!(body["filter"]["must"][0]["match"]["value"], 42);
        assert!(body["filter"].get("should").is_none());
        assert_eq!(body["limit"], 5);
        assert_eq!(body["with_payload"], true);
        assert!((body["score_threshold"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_upsert_body_shape() {
        let body = upsert_body(&[VectorRecord {
            id: 99,
            vector: vec![0.1, 0.2],
            payload: VectorPayload {
                content_id: 3,
                text: "slice".to_string(),
                title: "Intro".to_string(),
                start_seconds: 30,
            },
        }])
        .unwrap();

        let point = &body["points"][0];
        assert_eq!(point["id"], 99);
        assert_eq!(point["payload"]["contentId"], 3);
        assert_eq!(point["payload"]["text"], "slice");
        assert_eq!(point["payload"]["startSeconds"], 30);
    }

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "result": [
                { "id": 7, "score": 0.91, "payload": { "contentId": 1, "text": "a" } },
                { "id": "8c5b-uuid", "score": 0.80, "payload": { "contentId": 1, "text": "b" } },
                { "id": 9, "score": 0.75 }
            ],
            "status": "ok",
            "time": 0.001
        });

        let points = parse_search_response(body).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, 7);
        assert_eq!(points[0].payload.text, "a");
    }

    #[test]
    fn test_create_collection_body() {
        let body = create_collection_body(1536);
        assert_eq!(body["vectors"]["size"], 1536);
        assert_eq!(body["vectors"]["distance"], "Cosine");
    }
}
