use async_trait::async_trait;
use catalog::{CatalogError, Operation, Product, ProductCatalog, ProductId, UpstreamError};
use http::StatusCode;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;

enum SimilarReply {
    Ids(Vec<ProductId>),
    NotFound,
    Failure,
}

enum ProductReply {
    Found(Duration),
    NotFound,
    Failure(Duration),
    Panic,
}

/// In-memory [`ProductCatalog`] with scripted replies and call counters.
#[derive(Default)]
pub struct StubCatalog {
    similar: HashMap<ProductId, SimilarReply>,
    products: HashMap<ProductId, ProductReply>,
    similar_calls: AtomicU32,
    product_calls: Mutex<HashMap<ProductId, u32>>,
    completed_fetches: AtomicU32,
}

pub fn test_product(id: &str) -> Product {
    Product::new(
        ProductId::from(id),
        format!("Product {id}"),
        Decimal::new(1999, 2),
        true,
    )
}

fn retrieval_failed(operation: Operation, id: &ProductId) -> CatalogError {
    CatalogError::RetrievalFailed {
        operation,
        id: id.clone(),
        cause: UpstreamError::Status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_similar(mut self, id: &str, similar: &[&str]) -> Self {
        let ids = similar.iter().map(|s| ProductId::from(*s)).collect();
        self.similar.insert(id.into(), SimilarReply::Ids(ids));
        self
    }

    pub fn with_similar_not_found(mut self, id: &str) -> Self {
        self.similar.insert(id.into(), SimilarReply::NotFound);
        self
    }

    pub fn with_similar_failure(mut self, id: &str) -> Self {
        self.similar.insert(id.into(), SimilarReply::Failure);
        self
    }

    pub fn with_product(mut self, id: &str, delay: Duration) -> Self {
        self.products.insert(id.into(), ProductReply::Found(delay));
        self
    }

    pub fn with_missing_product(mut self, id: &str) -> Self {
        self.products.insert(id.into(), ProductReply::NotFound);
        self
    }

    pub fn with_failing_product(mut self, id: &str, delay: Duration) -> Self {
        self.products.insert(id.into(), ProductReply::Failure(delay));
        self
    }

    pub fn with_panicking_product(mut self, id: &str) -> Self {
        self.products.insert(id.into(), ProductReply::Panic);
        self
    }

    pub fn similar_calls(&self) -> u32 {
        self.similar_calls.load(Ordering::SeqCst)
    }

    pub fn product_calls(&self, id: &str) -> u32 {
        let calls = self.product_calls.lock().unwrap();
        calls.get(&ProductId::from(id)).copied().unwrap_or(0)
    }

    pub fn product_calls_total(&self) -> u32 {
        self.product_calls.lock().unwrap().values().sum()
    }

    /// Product calls that ran to completion, successful or not.
    pub fn completed_fetches(&self) -> u32 {
        self.completed_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn similar_ids(&self, id: &ProductId) -> Result<Vec<ProductId>, CatalogError> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        match self.similar.get(id) {
            Some(SimilarReply::Ids(ids)) => Ok(ids.clone()),
            Some(SimilarReply::NotFound) | None => Err(CatalogError::NotFound(id.clone())),
            Some(SimilarReply::Failure) => Err(retrieval_failed(Operation::SimilarIds, id)),
        }
    }

    async fn product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        *self
            .product_calls
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_insert(0) += 1;

        let result = match self.products.get(id) {
            Some(ProductReply::Found(delay)) => {
                sleep(*delay).await;
                Ok(test_product(id.as_str()))
            }
            Some(ProductReply::Failure(delay)) => {
                sleep(*delay).await;
                Err(retrieval_failed(Operation::ProductDetails, id))
            }
            Some(ProductReply::Panic) => panic!("stub catalog failure for product {id}"),
            Some(ProductReply::NotFound) | None => Err(CatalogError::NotFound(id.clone())),
        };

        self.completed_fetches.fetch_add(1, Ordering::SeqCst);
        result
    }
}
