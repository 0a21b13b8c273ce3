//! HTTP surface: `GET /product/{id}/similar`.

use crate::errors::{ErrorKind, SimilarProductsError};
use crate::metrics_defs::SIMILAR_PRODUCTS_REQUEST;
use crate::service::SimilarProductsService;
use catalog::{Product, ProductId};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{ALLOW, HeaderValue};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::counter;
use shared::http::{APPLICATION_JSON, make_error_response, make_json_response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";
const GENERIC_ERROR_DETAIL: &str = "Something went wrong. Please try again later.";

#[derive(Serialize, Debug)]
struct ProductResponse<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    price: Decimal,
    availability: bool,
}

impl<'a> From<&'a Product> for ProductResponse<'a> {
    fn from(product: &'a Product) -> Self {
        ProductResponse {
            id: product.id().as_str(),
            name: product.name(),
            price: product.price(),
            availability: product.is_available(),
        }
    }
}

/// RFC 7807 error body.
#[derive(Serialize, Debug)]
struct ProblemDetail {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    status: u16,
    detail: String,
    instance: String,
}

impl ProblemDetail {
    fn from_error(error: &SimilarProductsError, instance: &str) -> (StatusCode, Self) {
        let (status, title, detail) = match error.kind() {
            ErrorKind::InvalidId => (
                StatusCode::BAD_REQUEST,
                "Invalid Product Id",
                error.to_string(),
            ),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "Product Not Found", error.to_string()),
            ErrorKind::RetrievalFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to retrieve similar products",
                error.to_string(),
            ),
            // Details of unexpected failures stay in the logs
            ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                GENERIC_ERROR_DETAIL.to_string(),
            ),
        };

        let problem = ProblemDetail {
            problem_type: "about:blank",
            title,
            status: status.as_u16(),
            detail,
            instance: instance.to_string(),
        };
        (status, problem)
    }
}

/// Extracts the product id from `/product/{id}/similar`.
fn parse_similar_path(path: &str) -> Option<ProductId> {
    let raw = path.strip_prefix("/product/")?.strip_suffix("/similar")?;
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    let id = percent_encoding::percent_decode_str(raw).decode_utf8().ok()?;
    Some(ProductId::from(id.as_ref()))
}

#[derive(Clone)]
pub struct SimilarProductsApi {
    service: SimilarProductsService,
}

impl SimilarProductsApi {
    pub fn new(service: SimilarProductsService) -> Self {
        Self { service }
    }

    pub async fn handle(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        let Some(id) = parse_similar_path(path) else {
            tracing::debug!(%method, path, "No route matched");
            return make_error_response(StatusCode::NOT_FOUND);
        };

        if *method != Method::GET {
            let mut response = make_error_response(StatusCode::METHOD_NOT_ALLOWED);
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            return response;
        }

        let response = match self.service.get_similar_products(&id).await {
            Ok(products) => {
                let body: Vec<ProductResponse> = products.iter().map(ProductResponse::from).collect();
                make_json_response(StatusCode::OK, &body, APPLICATION_JSON)
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::Internal => {
                        tracing::error!(product_id = %id, error = %e, "Unexpected failure")
                    }
                    _ => tracing::info!(product_id = %id, error = %e, "Similar products lookup failed"),
                }
                let (status, problem) = ProblemDetail::from_error(&e, path);
                make_json_response(status, &problem, APPLICATION_PROBLEM_JSON)
            }
        };

        counter!(SIMILAR_PRODUCTS_REQUEST, "status" => response.status().as_u16().to_string())
            .increment(1);
        response
    }
}

impl Service<Request<Incoming>> for SimilarProductsApi {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let api = self.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        Box::pin(async move { Ok(api.handle(&method, &path).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::ProductFetcher;
    use crate::testutils::StubCatalog;
    use catalog::config::{CatalogConfig, RetryConfig};
    use catalog::testutils::MockUpstream;
    use catalog::{CatalogClient, ProductCatalog};
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn api(catalog: StubCatalog) -> SimilarProductsApi {
        let catalog: Arc<dyn ProductCatalog> = Arc::new(catalog);
        let fetcher = ProductFetcher::new(catalog.clone(), Handle::current());
        SimilarProductsApi::new(SimilarProductsService::new(catalog, fetcher))
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_parse_similar_path() {
        assert_eq!(parse_similar_path("/product/1/similar"), Some(ProductId::from("1")));
        assert_eq!(
            parse_similar_path("/product/a%20b/similar"),
            Some(ProductId::from("a b"))
        );
        assert_eq!(parse_similar_path("/product//similar"), None);
        assert_eq!(parse_similar_path("/product/1/2/similar"), None);
        assert_eq!(parse_similar_path("/product/1"), None);
        assert_eq!(parse_similar_path("/products/1/similar"), None);
    }

    #[tokio::test]
    async fn test_similar_products_response() {
        let api = api(
            StubCatalog::new()
                .with_similar("1", &["2", "3"])
                .with_product("2", Duration::ZERO)
                .with_product("3", Duration::ZERO),
        );

        let response = api.handle(&Method::GET, "/product/1/similar").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            r#"[{"id":"2","name":"Product 2","price":19.99,"availability":true},{"id":"3","name":"Product 3","price":19.99,"availability":true}]"#
        );
    }

    #[tokio::test]
    async fn test_empty_similar_products() {
        let api = api(StubCatalog::new().with_similar("1", &[]));

        let response = api.handle(&Method::GET, "/product/1/similar").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_not_found_problem() {
        let api = api(StubCatalog::new().with_similar_not_found("1"));

        let response = api.handle(&Method::GET, "/product/1/similar").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_PROBLEM_JSON);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Product Not Found");
        assert_eq!(body["status"], 404);
        assert_eq!(body["detail"], "Product 1 was not found");
        assert_eq!(body["instance"], "/product/1/similar");
    }

    #[tokio::test]
    async fn test_retrieval_failure_problem() {
        let api = api(
            StubCatalog::new()
                .with_similar("1", &["2", "3"])
                .with_product("2", Duration::ZERO)
                .with_failing_product("3", Duration::ZERO),
        );

        let response = api.handle(&Method::GET, "/product/1/similar").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Failed to retrieve similar products");
    }

    #[tokio::test]
    async fn test_retrieval_failure_hides_upstream_address() {
        // Nothing listens on port 1
        let mut config = CatalogConfig::new("http://127.0.0.1:1".parse().unwrap());
        config.retry = RetryConfig {
            max_attempts: 1,
            delay_ms: 1,
            multiplier: 1.0,
            max_delay_ms: 1,
        };
        let catalog: Arc<dyn ProductCatalog> = Arc::new(CatalogClient::new(&config).unwrap());
        let fetcher = ProductFetcher::new(catalog.clone(), Handle::current());
        let api = SimilarProductsApi::new(SimilarProductsService::new(catalog, fetcher));

        let response = api.handle(&Method::GET, "/product/1/similar").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let detail = body["detail"].as_str().unwrap();
        assert_eq!(
            detail,
            "Something went wrong retrieving similar product ids for product 1"
        );
        assert!(!detail.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_dot_segment_id_is_bad_request() {
        let upstream = MockUpstream::start(|_path| (StatusCode::OK, "[]".to_string())).await;
        let catalog: Arc<dyn ProductCatalog> =
            Arc::new(CatalogClient::new(&CatalogConfig::new(upstream.url())).unwrap());
        let fetcher = ProductFetcher::new(catalog.clone(), Handle::current());
        let api = SimilarProductsApi::new(SimilarProductsService::new(catalog, fetcher));

        let response = api.handle(&Method::GET, "/product/%2E%2E/similar").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_PROBLEM_JSON);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Invalid Product Id");
        assert_eq!(body["status"], 400);
        assert_eq!(upstream.total_hits(), 0);
    }

    #[tokio::test]
    async fn test_internal_error_is_not_leaked() {
        let api = api(
            StubCatalog::new()
                .with_similar("1", &["2"])
                .with_panicking_product("2"),
        );

        let response = api.handle(&Method::GET, "/product/1/similar").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Internal Server Error");
        assert_eq!(body["detail"], GENERIC_ERROR_DETAIL);
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let api = api(StubCatalog::new());

        let response = api.handle(&Method::GET, "/health").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = api.handle(&Method::POST, "/product/1/similar").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
    }
}
