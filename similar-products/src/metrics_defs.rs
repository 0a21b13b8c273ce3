//! Metrics definitions for the similar products service.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SIMILAR_PRODUCTS_REQUEST: MetricDef = MetricDef {
    name: "similar_products.request",
    metric_type: MetricType::Counter,
    description: "Similar products requests by response status",
};

pub const FANOUT_SIZE: MetricDef = MetricDef {
    name: "similar_products.fanout.size",
    metric_type: MetricType::Histogram,
    description: "Number of product detail fetches dispatched per request",
};

pub const FANOUT_DURATION: MetricDef = MetricDef {
    name: "similar_products.fanout.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch all product details of a request in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[SIMILAR_PRODUCTS_REQUEST, FANOUT_SIZE, FANOUT_DURATION];
