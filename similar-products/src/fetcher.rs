//! Concurrent retrieval of product details.

use crate::errors::{Result, SimilarProductsError};
use crate::metrics_defs::{FANOUT_DURATION, FANOUT_SIZE};
use catalog::{Product, ProductCatalog, ProductId};
use shared::histogram;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};

/// Outcome of one spawned fetch: the position of the id in the request and
/// what the catalog returned for it.
type FetchOutcome = (usize, std::result::Result<Product, catalog::CatalogError>);

/// Fans out one catalog call per id and joins the results back in input order.
///
/// Each id gets its own task (and therefore its own retry budget). The first
/// failure that is observed aborts every task still running; only that
/// failure is reported.
#[derive(Clone)]
pub struct ProductFetcher {
    catalog: Arc<dyn ProductCatalog>,
    /// Runtime the fetch tasks are spawned on.
    runtime: Handle,
}

impl ProductFetcher {
    pub fn new(catalog: Arc<dyn ProductCatalog>, runtime: Handle) -> Self {
        Self { catalog, runtime }
    }

    pub async fn fetch_all(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        histogram!(FANOUT_SIZE).record(ids.len() as f64);

        let mut join_set = self.spawn_fetches(ids);
        let result = self.collect_results(&mut join_set, ids).await;

        if !join_set.is_empty() {
            tracing::debug!(
                "Aborting {} outstanding product fetches",
                join_set.len()
            );
            join_set.abort_all();
            // Results of tasks that finish anyway are discarded
            while join_set.join_next().await.is_some() {}
        }

        histogram!(FANOUT_DURATION).record(start.elapsed().as_secs_f64());
        result
    }

    fn spawn_fetches(&self, ids: &[ProductId]) -> JoinSet<FetchOutcome> {
        let mut join_set = JoinSet::new();

        for (index, id) in ids.iter().cloned().enumerate() {
            let catalog = self.catalog.clone();
            join_set.spawn_on(
                async move {
                    let result = catalog.product(&id).await;
                    (index, result)
                },
                &self.runtime,
            );
        }

        join_set
    }

    /// Waits for the tasks to finish, placing every product in the slot of
    /// its id. Returns on the first failure, leaving the remaining tasks in
    /// the join set.
    async fn collect_results(
        &self,
        join_set: &mut JoinSet<FetchOutcome>,
        ids: &[ProductId],
    ) -> Result<Vec<Product>> {
        let mut slots: Vec<Option<Product>> = (0..ids.len()).map(|_| None).collect();

        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok((index, Ok(product))) => slots[index] = Some(product),
                Ok((index, Err(e))) => {
                    tracing::warn!(
                        product_id = %ids[index],
                        error = %e,
                        "Product fetch failed, cancelling remaining fetches"
                    );
                    return Err(SimilarProductsError::RetrievalFailed {
                        id: ids[index].clone(),
                        source: e,
                    });
                }
                Err(e) => return Err(task_failure(e)),
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| SimilarProductsError::Internal("fetch task produced no result".into()))
    }
}

fn task_failure(e: JoinError) -> SimilarProductsError {
    tracing::error!("Task failed: {e}");
    SimilarProductsError::Internal(e.to_string())
}
