//! Client for the upstream product catalog.
//!
//! Exposes the two read operations the catalog offers (similar ids for a
//! product, details of one product) behind the [`ProductCatalog`] trait, with
//! retry and backoff applied per call.

pub mod client;
pub mod config;
pub mod errors;
mod metrics_defs;
pub mod retry;
pub mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use client::{CatalogClient, ProductCatalog};
pub use errors::{CatalogError, ClientError, Operation, UpstreamError};
pub use metrics_defs::ALL_METRICS;
pub use types::{Product, ProductId};
