//! Metrics definitions for the catalog client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const CATALOG_REQUEST: MetricDef = MetricDef {
    name: "catalog.request",
    metric_type: MetricType::Counter,
    description: "Catalog calls by endpoint and final outcome (success, not_found, failed)",
};

pub const CATALOG_REQUEST_DURATION: MetricDef = MetricDef {
    name: "catalog.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time for a catalog call including retries, in seconds",
};

pub const CATALOG_RETRY: MetricDef = MetricDef {
    name: "catalog.retry",
    metric_type: MetricType::Counter,
    description: "Number of catalog request attempts that were retried",
};

pub const ALL_METRICS: &[MetricDef] = &[CATALOG_REQUEST, CATALOG_REQUEST_DURATION, CATALOG_RETRY];
