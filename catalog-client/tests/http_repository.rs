//! HTTP repository against a local axum API

use std::collections::HashMap;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use catalog_client::{
    ClientConfig, ClientError, HttpProductRepository, PageRequest, ProductCreate, ProductRepository,
};
use serde_json::{json, Value};

fn category_json(id: i64) -> Value {
    json!({ "id": id, "name": format!("Category {id}"), "slug": format!("category-{id}"), "image": "" })
}

fn product_json(id: i64, category_id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "slug": format!("product-{id}"),
        "price": 10 + id,
        "description": "fixture",
        "images": ["https://placehold.co/600x400"],
        "category": category_json(category_id),
        "creationAt": "2025-01-10T08:30:00.000Z",
        "updatedAt": "2025-01-10T08:30:00.000Z"
    })
}

fn page_of(params: &HashMap<String, String>, ids: impl Iterator<Item = i64>, category_id: i64) -> Vec<Value> {
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    ids.skip(offset).take(limit).map(|id| product_json(id, category_id)).collect()
}

async fn list_products(Query(params): Query<HashMap<String, String>>) -> Json<Vec<Value>> {
    Json(page_of(&params, 1..=25, 1))
}

async fn products_by_category(
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    Json(page_of(&params, 100..=104, id))
}

async fn get_product(Path(id): Path<i64>) -> Result<Json<Value>, (StatusCode, String)> {
    if id > 25 {
        return Err((StatusCode::NOT_FOUND, format!("product {id} not found")));
    }
    Ok(Json(product_json(id, 1)))
}

async fn create_product(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let mut created = product_json(26, body["categoryId"].as_i64().unwrap_or(1));
    created["title"] = body["title"].clone();
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_product(Path(_id): Path<i64>) -> Json<bool> {
    Json(true)
}

async fn list_categories(Query(params): Query<HashMap<String, String>>) -> Json<Vec<Value>> {
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
    Json((1..=5).take(limit).map(category_json).collect())
}

async fn get_category(Path(id): Path<i64>) -> Result<Json<Value>, (StatusCode, String)> {
    match id {
        0 => Err((StatusCode::UNPROCESSABLE_ENTITY, "id must be positive".into())),
        500 => Err((StatusCode::SERVICE_UNAVAILABLE, "database offline".into())),
        _ => Ok(Json(category_json(id))),
    }
}

async fn spawn_api() -> String {
    let app = Router::new()
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/{id}", get(get_product).delete(delete_product))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/categories/{id}", get(get_category))
        .route("/api/v1/categories/{id}/products", get(products_by_category));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1/", addr)
}

async fn repository(token: Option<&str>) -> HttpProductRepository {
    let mut config = ClientConfig::new(spawn_api().await).with_timeout(5);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    HttpProductRepository::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_get_products_pages_with_limit_and_offset() {
    let repo = repository(None).await;

    let first = repo.get_products(PageRequest::first(10)).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].id, 1);

    let last = repo.get_products(PageRequest::new(10, 20)).await.unwrap();
    assert_eq!(last.len(), 5);
    assert_eq!(last[0].id, 21);
    assert!(PageRequest::new(10, 20).is_last_page(last.len()));
}

#[tokio::test]
async fn test_get_products_by_category() {
    let repo = repository(None).await;

    let products = repo
        .get_products_by_category(3, PageRequest::first(2))
        .await
        .unwrap();
    assert_eq!(products.len(), 2);
    assert!(products.iter().all(|p| p.category.id == 3));
}

#[tokio::test]
async fn test_get_categories_respects_limit() {
    let repo = repository(None).await;
    let categories = repo.get_categories(3).await.unwrap();
    assert_eq!(categories.len(), 3);
}

#[tokio::test]
async fn test_missing_product_maps_to_not_found() {
    let repo = repository(None).await;
    let err = repo.get_product(999).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(msg) if msg.contains("999")));
}

#[tokio::test]
async fn test_create_requires_bearer_token() {
    let payload = ProductCreate {
        title: "Desk Lamp".into(),
        price: 25.0,
        description: "Warm light".into(),
        category_id: 2,
        images: vec![],
    };

    let anonymous = repository(None).await;
    let err = anonymous.create_product(&payload).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    let authorized = repository(Some("secret")).await;
    let created = authorized.create_product(&payload).await.unwrap();
    assert_eq!(created.title, "Desk Lamp");
    assert_eq!(created.category.id, 2);
}

#[tokio::test]
async fn test_delete_product() {
    let repo = repository(None).await;
    assert!(repo.delete_product(4).await.unwrap());
}

#[tokio::test]
async fn test_error_statuses_are_kept() {
    let repo = repository(None).await;

    let rejected = repo.get_category(0).await.unwrap_err();
    assert_eq!(rejected.status(), Some(422));
    assert!(matches!(&rejected, ClientError::Validation { body, .. } if body.contains("positive")));

    let offline = repo.get_category(500).await.unwrap_err();
    assert_eq!(offline.status(), Some(503));
    assert!(matches!(&offline, ClientError::Server { status: 503, .. }));
    assert_eq!(offline.to_string(), "Storefront API returned 503: database offline");

    let missing = repo.get_product(999).await.unwrap_err();
    assert_eq!(missing.status(), Some(404));
}
