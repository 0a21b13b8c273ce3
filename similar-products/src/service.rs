use crate::errors::Result;
use crate::fetcher::ProductFetcher;
use catalog::{Product, ProductCatalog, ProductId};
use std::sync::Arc;

/// Resolves the products similar to a given product: one lookup for the
/// similar ids, then the details of every id through the [`ProductFetcher`].
///
/// Errors from the id lookup are returned as the catalog reported them. No
/// retries happen here; the catalog client owns those.
#[derive(Clone)]
pub struct SimilarProductsService {
    catalog: Arc<dyn ProductCatalog>,
    fetcher: ProductFetcher,
}

impl SimilarProductsService {
    pub fn new(catalog: Arc<dyn ProductCatalog>, fetcher: ProductFetcher) -> Self {
        Self { catalog, fetcher }
    }

    pub async fn get_similar_products(&self, id: &ProductId) -> Result<Vec<Product>> {
        let similar_ids = self.catalog.similar_ids(id).await?;

        if similar_ids.is_empty() {
            tracing::debug!(product_id = %id, "No similar products");
            return Ok(Vec::new());
        }

        tracing::debug!(
            product_id = %id,
            count = similar_ids.len(),
            "Fetching similar product details"
        );
        self.fetcher.fetch_all(&similar_ids).await
    }
}
