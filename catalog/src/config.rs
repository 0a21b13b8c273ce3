use serde::Deserialize;
use url::Url;

/// Placeholder substituted with the product id in endpoint path templates.
pub const PRODUCT_ID_PLACEHOLDER: &str = "{productId}";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{0} path template must contain {{productId}}")]
    MissingPlaceholder(&'static str),

    #[error("retry max_attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("retry multiplier must be at least 1.0, got {0}")]
    InvalidMultiplier(f64),

    #[error("base URL must be http or https: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub connect_ms: u64,
    pub read_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            connect_ms: 1000,
            read_ms: 5000,
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, the first one included.
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

fn default_similar_ids_path() -> String {
    "/product/{productId}/similarids".into()
}

fn default_product_details_path() -> String {
    "/product/{productId}".into()
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct CatalogConfig {
    pub base_url: Url,
    #[serde(default = "default_similar_ids_path")]
    pub similar_ids_path: String,
    #[serde(default = "default_product_details_path")]
    pub product_details_path: String,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl CatalogConfig {
    pub fn new(base_url: Url) -> Self {
        CatalogConfig {
            base_url,
            similar_ids_path: default_similar_ids_path(),
            product_details_path: default_product_details_path(),
            timeouts: Timeouts::default(),
            retry: RetryConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.to_string()));
        }
        if !self.similar_ids_path.contains(PRODUCT_ID_PLACEHOLDER) {
            return Err(ValidationError::MissingPlaceholder("similar_ids_path"));
        }
        if !self.product_details_path.contains(PRODUCT_ID_PLACEHOLDER) {
            return Err(ValidationError::MissingPlaceholder("product_details_path"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.retry.multiplier < 1.0 {
            return Err(ValidationError::InvalidMultiplier(self.retry.multiplier));
        }
        Ok(())
    }
}
