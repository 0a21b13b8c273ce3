//! Test doubles for code talking to the catalog over HTTP.

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

pub const PRODUCT_2_JSON: &str = r#"{"id":"2","name":"Dress","price":19.99,"availability":true}"#;

/// In-process catalog double. Answers every request with whatever the
/// handler returns for the request path and counts hits per path.
pub struct MockUpstream {
    port: u16,
    hits: Arc<Mutex<HashMap<String, u32>>>,
}

impl MockUpstream {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handler = Arc::new(handler);
        let hits = Arc::new(Mutex::new(HashMap::new()));

        let server_hits = hits.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let handler = handler.clone();
                let hits = server_hits.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let path = req.uri().path().to_string();
                        *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
                        let (status, body) = handler(&path);
                        async move {
                            let mut response = Response::new(Full::new(Bytes::from(body)));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        MockUpstream { port, hits }
    }

    /// Serves a fixed route table. Paths missing from the table answer 404.
    pub async fn with_routes(routes: Vec<(&'static str, StatusCode, &'static str)>) -> Self {
        let routes: HashMap<&'static str, (StatusCode, &'static str)> = routes
            .into_iter()
            .map(|(path, status, body)| (path, (status, body)))
            .collect();

        Self::start(move |path| match routes.get(path) {
            Some((status, body)) => (*status, body.to_string()),
            None => (StatusCode::NOT_FOUND, String::new()),
        })
        .await
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}", self.port)).unwrap()
    }

    pub fn hits(&self, path: &str) -> u32 {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> u32 {
        self.hits.lock().unwrap().values().sum()
    }
}
