use crate::types::ProductId;
use reqwest::StatusCode;
use std::fmt;

/// The catalog operation an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    SimilarIds,
    ProductDetails,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::SimilarIds => "similar_ids",
            Operation::ProductDetails => "product_details",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SimilarIds => f.write_str("similar product ids"),
            Operation::ProductDetails => f.write_str("product details"),
        }
    }
}

/// Failure of a single request attempt against the catalog.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("product not found upstream")]
    NotFound,
    #[error("upstream responded with status {0}")]
    Status(StatusCode),
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("upstream returned an empty body")]
    EmptyBody,
}

impl UpstreamError {
    /// Everything except a 404 is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, UpstreamError::NotFound)
    }
}

/// Errors surfaced by [`crate::ProductCatalog`] operations.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Product {0} was not found")]
    NotFound(ProductId),

    /// The id expands to a `.` or `..` path segment, which URL resolution
    /// would drop from the request path.
    #[error("Product id {0} cannot be used in a catalog path")]
    InvalidId(ProductId),

    /// The cause stays out of the message; it is logged and kept as the source.
    #[error("Something went wrong retrieving {operation} for product {id}")]
    RetrievalFailed {
        operation: Operation,
        id: ProductId,
        #[source]
        cause: UpstreamError,
    },
}

impl CatalogError {
    /// Classifies the final attempt error of a call.
    pub(crate) fn from_attempt(operation: Operation, id: &ProductId, error: UpstreamError) -> Self {
        match error {
            UpstreamError::NotFound => CatalogError::NotFound(id.clone()),
            cause => CatalogError::RetrievalFailed {
                operation,
                id: id.clone(),
                cause,
            },
        }
    }
}

/// Errors raised while building a catalog client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}
