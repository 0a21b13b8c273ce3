pub mod api;
pub mod config;
pub mod errors;
pub mod fetcher;
mod metrics_defs;
pub mod service;

#[cfg(test)]
mod testutils;

use api::SimilarProductsApi;
use catalog::{CatalogClient, ProductCatalog};
use fetcher::ProductFetcher;
use service::SimilarProductsService;
use shared::http::run_http_service;
use shared::metrics_defs::MetricDef;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

pub use errors::{ErrorKind, SimilarProductsError};
pub use metrics_defs::ALL_METRICS;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] config::ValidationError),
    #[error("could not build catalog client: {0}")]
    Client(#[from] catalog::ClientError),
}

/// All metrics recorded by this service and the catalog client.
pub fn all_metrics() -> Vec<MetricDef> {
    ALL_METRICS
        .iter()
        .chain(catalog::ALL_METRICS)
        .copied()
        .collect()
}

/// Wires the catalog client, fetcher and service together. Product fetches
/// are spawned on `runtime`.
pub fn build_api(config: &config::Config, runtime: Handle) -> Result<SimilarProductsApi, RunError> {
    config.validate()?;

    let catalog: Arc<dyn ProductCatalog> = Arc::new(CatalogClient::new(&config.catalog)?);
    let fetcher = ProductFetcher::new(catalog.clone(), runtime);
    let service = SimilarProductsService::new(catalog, fetcher);
    Ok(SimilarProductsApi::new(service))
}

/// Serves the API on the configured listener until `shutdown` resolves.
pub async fn run<F>(config: config::Config, shutdown: F) -> Result<(), RunError>
where
    F: Future<Output = ()>,
{
    let api = build_api(&config, Handle::current())?;
    tracing::info!(
        catalog = %config.catalog.base_url,
        max_attempts = config.catalog.retry.max_attempts,
        "Starting similar products service"
    );
    run_http_service(&config.listener.host, config.listener.port, api, shutdown).await?;
    Ok(())
}
