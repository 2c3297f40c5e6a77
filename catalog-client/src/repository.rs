//! Product repository
//!
//! Stateless page fetches and mutations against the storefront API.
//! No caching and no retries: every failure is returned unchanged.

use async_trait::async_trait;
use shared::{Category, CategoryCreate, CategoryUpdate, PageRequest, Product, ProductCreate, ProductUpdate};

use crate::{ClientConfig, ClientResult, HttpClient};

/// Network access to product and category resources
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// `GET /products?limit&offset`
    async fn get_products(&self, page: PageRequest) -> ClientResult<Vec<Product>>;

    /// `GET /categories/{id}/products?limit&offset`
    async fn get_products_by_category(
        &self,
        category_id: i64,
        page: PageRequest,
    ) -> ClientResult<Vec<Product>>;

    /// `GET /products/{id}`
    async fn get_product(&self, id: i64) -> ClientResult<Product>;

    /// `POST /products`
    async fn create_product(&self, data: &ProductCreate) -> ClientResult<Product>;

    /// `PUT /products/{id}`
    async fn update_product(&self, id: i64, data: &ProductUpdate) -> ClientResult<Product>;

    /// `DELETE /products/{id}`
    async fn delete_product(&self, id: i64) -> ClientResult<bool>;

    /// `GET /categories?limit`
    async fn get_categories(&self, limit: usize) -> ClientResult<Vec<Category>>;

    /// `GET /categories/{id}`
    async fn get_category(&self, id: i64) -> ClientResult<Category>;

    /// `POST /categories`
    async fn create_category(&self, data: &CategoryCreate) -> ClientResult<Category>;

    /// `PUT /categories/{id}`
    async fn update_category(&self, id: i64, data: &CategoryUpdate) -> ClientResult<Category>;

    /// `DELETE /categories/{id}`
    async fn delete_category(&self, id: i64) -> ClientResult<bool>;
}

/// [`ProductRepository`] backed by [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpProductRepository {
    http: HttpClient,
}

impl HttpProductRepository {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Build the HTTP client from configuration
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(config.build_http_client()?))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl ProductRepository for HttpProductRepository {
    async fn get_products(&self, page: PageRequest) -> ClientResult<Vec<Product>> {
        tracing::debug!(limit = page.limit, offset = page.offset, "GET /products");
        self.http.get_with_query("/products", &page.query()).await
    }

    async fn get_products_by_category(
        &self,
        category_id: i64,
        page: PageRequest,
    ) -> ClientResult<Vec<Product>> {
        tracing::debug!(
            category_id,
            limit = page.limit,
            offset = page.offset,
            "GET /categories/{{id}}/products"
        );
        self.http
            .get_with_query(&format!("/categories/{}/products", category_id), &page.query())
            .await
    }

    async fn get_product(&self, id: i64) -> ClientResult<Product> {
        self.http.get(&format!("/products/{}", id)).await
    }

    async fn create_product(&self, data: &ProductCreate) -> ClientResult<Product> {
        tracing::debug!(title = %data.title, "POST /products");
        self.http.post("/products", data).await
    }

    async fn update_product(&self, id: i64, data: &ProductUpdate) -> ClientResult<Product> {
        tracing::debug!(id, "PUT /products/{{id}}");
        self.http.put(&format!("/products/{}", id), data).await
    }

    async fn delete_product(&self, id: i64) -> ClientResult<bool> {
        tracing::debug!(id, "DELETE /products/{{id}}");
        self.http.delete(&format!("/products/{}", id)).await
    }

    async fn get_categories(&self, limit: usize) -> ClientResult<Vec<Category>> {
        tracing::debug!(limit, "GET /categories");
        self.http
            .get_with_query("/categories", &[("limit", limit.to_string())])
            .await
    }

    async fn get_category(&self, id: i64) -> ClientResult<Category> {
        self.http.get(&format!("/categories/{}", id)).await
    }

    async fn create_category(&self, data: &CategoryCreate) -> ClientResult<Category> {
        tracing::debug!(name = %data.name, "POST /categories");
        self.http.post("/categories", data).await
    }

    async fn update_category(&self, id: i64, data: &CategoryUpdate) -> ClientResult<Category> {
        tracing::debug!(id, "PUT /categories/{{id}}");
        self.http.put(&format!("/categories/{}", id), data).await
    }

    async fn delete_category(&self, id: i64) -> ClientResult<bool> {
        tracing::debug!(id, "DELETE /categories/{{id}}");
        self.http.delete(&format!("/categories/{}", id)).await
    }
}
