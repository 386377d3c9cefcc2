//! Integration test support for Solemate.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p solemate-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_flow` - Cart store and derived values driven end to end
//! - `cart_concurrency` - Pending markers and interleaved commands
//! - `http_catalog` - REST catalog client against a local server
//!
//! # Fixtures
//!
//! - [`ScriptedCatalog`] - in-process catalog whose lookups can be made to
//!   fail or to wait until released
//! - [`CatalogServer`] - loopback HTTP server answering canned JSON routes

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use solemate_core::ProductId;
use solemate_storefront::catalog::{CatalogError, Product, ProductCatalog};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use url::Url;

/// A product priced in cents.
#[must_use]
pub fn product(id: i32, title: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        price: Decimal::new(cents, 2),
        image: format!("https://img.example/{id}.jpg"),
    }
}

// =============================================================================
// ScriptedCatalog
// =============================================================================

/// In-process catalog with scripted failures and gated lookups.
#[derive(Default)]
pub struct ScriptedCatalog {
    products: Vec<Product>,
    lookups: AtomicUsize,
    failing: Mutex<HashSet<ProductId>>,
    gates: Mutex<HashMap<ProductId, Arc<Notify>>>,
}

impl ScriptedCatalog {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    /// Number of `get_product` calls so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make lookups of `id` fail with a 503 status.
    pub fn fail(&self, id: ProductId) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    /// Hold lookups of `id` until the returned handle is notified.
    ///
    /// A notification sent before the lookup starts is kept, so
    /// `notify_one` may be called at any time.
    #[must_use]
    pub fn gate(&self, id: ProductId) -> Arc<Notify> {
        Arc::clone(
            self.gates
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id)
                .or_default(),
        )
    }
}

#[async_trait]
impl ProductCatalog for ScriptedCatalog {
    async fn get_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
        {
            return Err(CatalogError::Status {
                status: 503,
                body: "catalog unavailable".to_string(),
            });
        }

        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Product not found: {id}")))
    }
}

// =============================================================================
// CatalogServer
// =============================================================================

/// A canned response for one request path.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl Route {
    /// `200 OK` with `value` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn json<T: serde::Serialize + ?Sized>(path: &str, value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            path: path.to_string(),
            status: 200,
            body: serde_json::to_string(value)?,
        })
    }

    /// Any status with a raw body.
    #[must_use]
    pub fn status(path: &str, status: u16, body: &str) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: body.to_string(),
        }
    }
}

/// Loopback HTTP server that answers each path with a fixed response.
///
/// Unknown paths get `404`. Every request path is recorded. The server stops
/// when dropped.
pub struct CatalogServer {
    base_url: Url,
    requests: RequestLog,
    task: JoinHandle<()>,
}

type RequestLog = Arc<Mutex<Vec<String>>>;

impl CatalogServer {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if a route carries an invalid status code or the
    /// listener cannot be bound.
    pub async fn start(routes: Vec<Route>) -> io::Result<Self> {
        let requests = RequestLog::default();

        let mut router = Router::new();
        for route in routes {
            let status = StatusCode::from_u16(route.status).map_err(io::Error::other)?;
            let body = route.body;
            router = router.route(
                &route.path,
                get(move || {
                    let body = body.clone();
                    async move { (status, [(header::CONTENT_TYPE, "application/json")], body) }
                }),
            );
        }
        let router = router
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(Arc::clone(&requests), record));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/")).map_err(io::Error::other)?;

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Catalog test server stopped");
            }
        });

        Ok(Self {
            base_url,
            requests,
            task,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Paths requested so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `path` was requested.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| *p == path).count()
    }
}

impl Drop for CatalogServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record(State(requests): State<RequestLog>, request: Request, next: Next) -> Response {
    requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request.uri().path().to_string());
    next.run(request).await
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))
}
