use crate::config::{CatalogConfig, PRODUCT_ID_PLACEHOLDER};
use crate::errors::{CatalogError, ClientError, Operation, UpstreamError};
use crate::metrics_defs::{CATALOG_REQUEST, CATALOG_REQUEST_DURATION};
use crate::retry::RetryPolicy;
use crate::types::{Product, ProductId, ProductRecord};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use shared::{counter, histogram};
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Ids of the products similar to `id`, in the order the catalog ranks them.
    async fn similar_ids(&self, id: &ProductId) -> Result<Vec<ProductId>, CatalogError>;

    /// Details of a single product.
    async fn product(&self, id: &ProductId) -> Result<Product, CatalogError>;
}

/// HTTP client for the catalog. Every call is retried according to the
/// configured [`RetryPolicy`], except when the catalog answers 404.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    similar_ids_path: String,
    product_details_path: String,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, ClientError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.timeouts.connect_ms))
            .read_timeout(Duration::from_millis(config.timeouts.read_ms))
            .build()?;

        Ok(CatalogClient {
            client,
            base_url: config.base_url.clone(),
            similar_ids_path: config.similar_ids_path.clone(),
            product_details_path: config.product_details_path.clone(),
            retry: RetryPolicy::from(&config.retry),
        })
    }

    /// Expands a path template below the base URL. The id is percent-encoded
    /// as a single path segment.
    fn endpoint_url(&self, template: &str, id: &ProductId) -> Result<Url, CatalogError> {
        let segments: Vec<String> = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.replace(PRODUCT_ID_PLACEHOLDER, id.as_str()))
            .collect();

        // Dot segments are resolved away by the URL parser, percent-encoded or not
        if segments.iter().any(|s| s == "." || s == "..") {
            tracing::warn!(product_id = %id, "Product id is a dot path segment");
            return Err(CatalogError::InvalidId(id.clone()));
        }

        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&segments);
        }
        Ok(url)
    }

    /// Sends a GET and returns the raw body of a 2xx response.
    async fn get(&self, url: &Url) -> Result<bytes::Bytes, UpstreamError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(UpstreamError::NotFound),
            status if status.is_success() => Ok(response.bytes().await?),
            status => Err(UpstreamError::Status(status)),
        }
    }

    async fn fetch_similar_ids_once(&self, url: &Url) -> Result<Vec<ProductId>, UpstreamError> {
        let body = self.get(url).await?;
        if body.trim_ascii().is_empty() {
            return Ok(Vec::new());
        }
        let ids: Option<Vec<ProductId>> = serde_json::from_slice(&body)?;
        Ok(ids.unwrap_or_default())
    }

    async fn fetch_product_once(&self, url: &Url) -> Result<Product, UpstreamError> {
        let body = self.get(url).await?;
        if body.trim_ascii().is_empty() {
            return Err(UpstreamError::EmptyBody);
        }
        let record: Option<ProductRecord> = serde_json::from_slice(&body)?;
        record.map(Product::from).ok_or(UpstreamError::EmptyBody)
    }

    /// Runs one catalog call under the retry policy and classifies the outcome.
    async fn call<T, F, Fut>(
        &self,
        operation: Operation,
        id: &ProductId,
        attempt: F,
    ) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let start = Instant::now();
        let result = self
            .retry
            .run(operation.as_str(), attempt, UpstreamError::is_retryable)
            .await;
        histogram!(CATALOG_REQUEST_DURATION, "endpoint" => operation.as_str())
            .record(start.elapsed().as_secs_f64());

        let error = match result {
            Ok(value) => {
                counter!(CATALOG_REQUEST, "endpoint" => operation.as_str(), "outcome" => "success")
                    .increment(1);
                return Ok(value);
            }
            Err(e) => CatalogError::from_attempt(operation, id, e),
        };

        let outcome = match &error {
            CatalogError::NotFound(_) => {
                tracing::error!(product_id = %id, %operation, "Product {id} was not found");
                "not_found"
            }
            CatalogError::RetrievalFailed { cause, .. } => {
                tracing::error!(
                    product_id = %id,
                    %operation,
                    error = %cause,
                    "Something went wrong retrieving {operation} for product {id}"
                );
                "failed"
            }
            CatalogError::InvalidId(_) => "invalid_id",
        };
        counter!(CATALOG_REQUEST, "endpoint" => operation.as_str(), "outcome" => outcome)
            .increment(1);

        Err(error)
    }
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    async fn similar_ids(&self, id: &ProductId) -> Result<Vec<ProductId>, CatalogError> {
        let url = self.endpoint_url(&self.similar_ids_path, id)?;
        tracing::debug!(product_id = %id, %url, "Fetching similar product ids");
        self.call(Operation::SimilarIds, id, || self.fetch_similar_ids_once(&url))
            .await
    }

    async fn product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let url = self.endpoint_url(&self.product_details_path, id)?;
        tracing::debug!(product_id = %id, %url, "Fetching product details");
        self.call(Operation::ProductDetails, id, || self.fetch_product_once(&url))
            .await
    }
}
