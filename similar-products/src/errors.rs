use catalog::{CatalogError, ProductId};
use thiserror::Error;

/// Result type alias for similar-products operations
pub type Result<T, E = SimilarProductsError> = std::result::Result<T, E>;

/// Coarse classification used at the HTTP boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidId,
    NotFound,
    RetrievalFailed,
    Internal,
}

/// Errors that can occur while resolving similar products
#[derive(Error, Debug)]
pub enum SimilarProductsError {
    /// Failure of the similar ids lookup, passed through as the catalog reported it.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// At least one product detail fetch failed. Reports the first failure
    /// that was observed; a missing product counts as a failure here too.
    #[error("Something went wrong retrieving product details for product {id}")]
    RetrievalFailed {
        id: ProductId,
        #[source]
        source: CatalogError,
    },

    /// A fetch task died without producing a result.
    #[error("Fetch task failed: {0}")]
    Internal(String),
}

impl SimilarProductsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimilarProductsError::Catalog(CatalogError::InvalidId(_)) => ErrorKind::InvalidId,
            SimilarProductsError::Catalog(CatalogError::NotFound(_)) => ErrorKind::NotFound,
            SimilarProductsError::Catalog(CatalogError::RetrievalFailed { .. })
            | SimilarProductsError::RetrievalFailed { .. } => ErrorKind::RetrievalFailed,
            SimilarProductsError::Internal(_) => ErrorKind::Internal,
        }
    }
}
