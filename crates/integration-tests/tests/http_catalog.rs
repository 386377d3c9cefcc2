//! REST catalog client against a loopback server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use solemate_core::{CurrencyCode, ProductId};
use solemate_integration_tests::{CatalogServer, Route, product};
use solemate_storefront::cart::{CartError, CartStore};
use solemate_storefront::catalog::{CatalogError, HttpCatalog, ProductCatalog};
use solemate_storefront::config::CatalogConfig;
use solemate_storefront::listing::ProductListing;

fn client(server: &CatalogServer) -> HttpCatalog {
    HttpCatalog::new(&CatalogConfig {
        base_url: server.base_url().clone(),
        request_timeout: Duration::from_secs(5),
        cache_ttl: Duration::from_secs(60),
    })
    .unwrap()
}

fn products_route() -> Route {
    Route::json(
        "/products",
        &[product(1, "Shoe", 10000), product(2, "Boot", 24990)],
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_is_cached_and_warms_products() {
    let server = CatalogServer::start(vec![products_route()]).await.unwrap();
    let catalog = client(&server);

    let first = catalog.get_all_products().await.unwrap();
    let second = catalog.get_all_products().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(server.hits("/products"), 1);

    // Served from the entries the list populated
    let boot = catalog.get_product(ProductId::new(2)).await.unwrap();
    assert_eq!(boot.title, "Boot");
    assert_eq!(server.requests(), vec!["/products"]);
}

#[tokio::test]
async fn test_single_product_route() {
    let server = CatalogServer::start(vec![
        Route::json("/products/1", &product(1, "Shoe", 10000)).unwrap(),
    ])
    .await
    .unwrap();
    let catalog = client(&server);

    let shoe = catalog.get_product(ProductId::new(1)).await.unwrap();
    assert_eq!(shoe.price.to_string(), "100.00");
    catalog.get_product(ProductId::new(1)).await.unwrap();
    assert_eq!(server.hits("/products/1"), 1);
}

#[tokio::test]
async fn test_missing_product_route_falls_back_to_list() {
    let server = CatalogServer::start(vec![products_route()]).await.unwrap();
    let catalog = client(&server);

    let shoe = catalog.get_product(ProductId::new(1)).await.unwrap();
    assert_eq!(shoe.title, "Shoe");
    assert_eq!(server.requests(), vec!["/products/1", "/products"]);

    let err = catalog.get_product(ProductId::new(9)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = CatalogServer::start(vec![Route::status(
        "/products",
        503,
        "{\"error\":\"maintenance\"}",
    )])
    .await
    .unwrap();
    let catalog = client(&server);

    let err = catalog.get_all_products().await.unwrap_err();
    assert!(matches!(err, CatalogError::Status { status: 503, ref body } if body.contains("maintenance")));

    // Failures are not cached
    let _ = catalog.get_all_products().await;
    assert_eq!(server.hits("/products"), 2);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = CatalogServer::start(vec![Route::status("/products", 200, "[{\"id\": \"one\"}]")])
        .await
        .unwrap();
    let catalog = client(&server);

    let err = catalog.get_all_products().await.unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[tokio::test]
async fn test_base_path_is_kept() {
    let server = CatalogServer::start(vec![
        Route::json("/api/v1/products", &[product(3, "Sandal", 4950)]).unwrap(),
    ])
    .await
    .unwrap();
    let catalog = HttpCatalog::new(&CatalogConfig {
        base_url: server.base_url().join("api/v1").unwrap(),
        request_timeout: Duration::from_secs(5),
        cache_ttl: Duration::from_secs(60),
    })
    .unwrap();

    let products = catalog.get_all_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(server.requests(), vec!["/api/v1/products"]);
}

#[tokio::test]
async fn test_cart_and_listing_over_http() {
    let server = CatalogServer::start(vec![products_route()]).await.unwrap();
    let catalog = client(&server);

    let mut listing = ProductListing::new(CurrencyCode::BRL);
    listing.load(&catalog).await.unwrap();
    assert!(!listing.is_loading());

    let cart = CartStore::default();
    cart.add_to_cart(ProductId::new(1), &catalog).await.unwrap();
    cart.add_to_cart(ProductId::new(1), &catalog).await.unwrap();
    assert_eq!(cart.view().total, "R$200.00");

    let err = cart
        .add_to_cart(ProductId::new(7), &catalog)
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::CatalogLookupFailed { ref source, .. } if source.is_not_found()));

    let tiles = listing.tiles(&cart);
    assert_eq!(tiles.first().map(|t| t.amount), Some(2));
    // One list fetch, one miss on /products/7; the rest came from cache
    assert_eq!(server.hits("/products"), 1);
    assert_eq!(server.hits("/products/7"), 1);
}
