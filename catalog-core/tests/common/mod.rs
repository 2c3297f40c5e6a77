//! In-memory repository and reconciler shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog_client::{ClientError, ClientResult, ProductRepository};
use catalog_core::{
    BackupReconciler, CatalogConfig, CatalogContext, ProductCacheCoordinator, ProductStore,
    RecoveryOutcome,
};
use parking_lot::Mutex;
use shared::{
    Category, CategoryCreate, CategoryUpdate, PageRequest, Product, ProductCreate, ProductUpdate,
};

/// Repository call, recorded when the request starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Products { limit: usize, offset: usize },
    ByCategory { id: i64, limit: usize, offset: usize },
    Product(i64),
    CreateProduct(String),
    UpdateProduct(i64),
    DeleteProduct(i64),
    Categories { limit: usize },
    Category(i64),
    CreateCategory(String),
    UpdateCategory(i64),
    DeleteCategory(i64),
}

pub fn category(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        slug: name.to_lowercase(),
        image: String::new(),
        creation_at: None,
        updated_at: None,
    }
}

pub fn product(id: i64, title: &str, category: &Category) -> Product {
    Product {
        id,
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        price: (id * 10) as f64,
        description: "Fixture product".to_string(),
        images: vec![format!("https://img.test/{id}.jpg")],
        category: category.clone(),
        creation_at: None,
        updated_at: None,
    }
}

/// Ten products in three categories: three shirts and one hat among them
pub fn catalog() -> (Vec<Category>, Vec<Product>) {
    let clothes = category(1, "Clothes");
    let electronics = category(2, "Electronics");
    let furniture = category(3, "Furniture");
    let products = vec![
        product(1, "Blue Shirt", &clothes),
        product(2, "Red Shirt", &clothes),
        product(3, "Wool Hat", &clothes),
        product(4, "Laptop", &electronics),
        product(5, "Phone", &electronics),
        product(6, "Headphones", &electronics),
        product(7, "Desk", &furniture),
        product(8, "Chair", &furniture),
        product(9, "Sofa", &furniture),
        product(10, "Green Shirt", &clothes),
    ];
    (vec![clothes, electronics, furniture], products)
}

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    categories: Vec<Category>,
    next_id: i64,
}

/// Recording in-memory [`ProductRepository`]
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    calls: Mutex<Vec<Call>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryRepository {
    pub fn new(categories: Vec<Category>, products: Vec<Product>) -> Arc<Self> {
        let next_id = 1000;
        Arc::new(Self {
            tables: Mutex::new(Tables {
                products,
                categories,
                next_id,
            }),
            ..Default::default()
        })
    }

    pub fn with_catalog() -> Arc<Self> {
        let (categories, products) = catalog();
        Self::new(categories, products)
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn products(&self) -> Vec<Product> {
        self.tables.lock().products.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.tables.lock().categories.clone()
    }

    async fn begin(&self, call: Call) -> ClientResult<()> {
        self.calls.lock().push(call);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Server {
                status: 503,
                body: "backend unavailable".into(),
            });
        }
        Ok(())
    }

    fn next_id(tables: &mut Tables) -> i64 {
        tables.next_id += 1;
        tables.next_id
    }
}

fn paginate(products: impl Iterator<Item = Product>, page: PageRequest) -> Vec<Product> {
    products.skip(page.offset).take(page.limit).collect()
}

#[async_trait]
impl ProductRepository for MemoryRepository {
    async fn get_products(&self, page: PageRequest) -> ClientResult<Vec<Product>> {
        self.begin(Call::Products {
            limit: page.limit,
            offset: page.offset,
        })
        .await?;
        let tables = self.tables.lock();
        Ok(paginate(tables.products.iter().cloned(), page))
    }

    async fn get_products_by_category(
        &self,
        category_id: i64,
        page: PageRequest,
    ) -> ClientResult<Vec<Product>> {
        self.begin(Call::ByCategory {
            id: category_id,
            limit: page.limit,
            offset: page.offset,
        })
        .await?;
        let tables = self.tables.lock();
        let scoped = tables
            .products
            .iter()
            .filter(|p| p.category.id == category_id)
            .cloned();
        Ok(paginate(scoped, page))
    }

    async fn get_product(&self, id: i64) -> ClientResult<Product> {
        self.begin(Call::Product(id)).await?;
        let tables = self.tables.lock();
        tables
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("product {id}")))
    }

    async fn create_product(&self, data: &ProductCreate) -> ClientResult<Product> {
        self.begin(Call::CreateProduct(data.title.clone())).await?;
        let mut tables = self.tables.lock();
        let category = tables
            .categories
            .iter()
            .find(|c| c.id == data.category_id)
            .cloned()
            .ok_or_else(|| ClientError::Validation {
                status: 400,
                body: format!("unknown category {}", data.category_id),
            })?;
        let id = Self::next_id(&mut tables);
        let mut created = product(id, &data.title, &category);
        created.price = data.price;
        created.description = data.description.clone();
        created.images = data.images.clone();
        tables.products.push(created.clone());
        Ok(created)
    }

    async fn update_product(&self, id: i64, data: &ProductUpdate) -> ClientResult<Product> {
        self.begin(Call::UpdateProduct(id)).await?;
        let mut tables = self.tables.lock();
        let slot = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("product {id}")))?;
        if let Some(title) = &data.title {
            slot.title = title.clone();
        }
        if let Some(price) = data.price {
            slot.price = price;
        }
        if let Some(description) = &data.description {
            slot.description = description.clone();
        }
        Ok(slot.clone())
    }

    async fn delete_product(&self, id: i64) -> ClientResult<bool> {
        self.begin(Call::DeleteProduct(id)).await?;
        let mut tables = self.tables.lock();
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        Ok(tables.products.len() != before)
    }

    async fn get_categories(&self, limit: usize) -> ClientResult<Vec<Category>> {
        self.begin(Call::Categories { limit }).await?;
        let tables = self.tables.lock();
        Ok(tables.categories.iter().take(limit).cloned().collect())
    }

    async fn get_category(&self, id: i64) -> ClientResult<Category> {
        self.begin(Call::Category(id)).await?;
        let tables = self.tables.lock();
        tables
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("category {id}")))
    }

    async fn create_category(&self, data: &CategoryCreate) -> ClientResult<Category> {
        self.begin(Call::CreateCategory(data.name.clone())).await?;
        let mut tables = self.tables.lock();
        let id = Self::next_id(&mut tables);
        let mut created = category(id, &data.name);
        created.image = data.image.clone();
        tables.categories.push(created.clone());
        Ok(created)
    }

    async fn update_category(&self, id: i64, data: &CategoryUpdate) -> ClientResult<Category> {
        self.begin(Call::UpdateCategory(id)).await?;
        let mut tables = self.tables.lock();
        let slot = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("category {id}")))?;
        if let Some(name) = &data.name {
            slot.name = name.clone();
        }
        if let Some(image) = &data.image {
            slot.image = image.clone();
        }
        Ok(slot.clone())
    }

    async fn delete_category(&self, id: i64) -> ClientResult<bool> {
        self.begin(Call::DeleteCategory(id)).await?;
        let mut tables = self.tables.lock();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        Ok(tables.categories.len() != before)
    }
}

/// Reconciler that only counts invocations
#[derive(Default)]
pub struct CountingReconciler {
    reconciled: AtomicUsize,
    resets: AtomicUsize,
}

impl CountingReconciler {
    pub fn reconciled(&self) -> usize {
        self.reconciled.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackupReconciler for CountingReconciler {
    async fn reconcile(&self) -> RecoveryOutcome {
        self.reconciled.fetch_add(1, Ordering::SeqCst);
        RecoveryOutcome::ok("Database is healthy")
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub coordinator: ProductCacheCoordinator,
    pub repository: Arc<MemoryRepository>,
    pub reconciler: Arc<CountingReconciler>,
    pub context: Arc<CatalogContext>,
    pub config: CatalogConfig,
}

impl Harness {
    pub fn new(page_size: usize) -> Self {
        Self::with_repository(page_size, MemoryRepository::with_catalog())
    }

    pub fn with_repository(page_size: usize, repository: Arc<MemoryRepository>) -> Self {
        let config = CatalogConfig::default().with_page_size(page_size);
        let context = Arc::new(CatalogContext::new(&config));
        let reconciler = Arc::new(CountingReconciler::default());
        let coordinator = ProductCacheCoordinator::new(
            config.clone(),
            context.clone(),
            ProductStore::new(),
            repository.clone(),
            reconciler.clone(),
        );
        Self {
            coordinator,
            repository,
            reconciler,
            context,
            config,
        }
    }

    /// A second coordinator over the same context, with a fresh store
    pub fn sibling(&self) -> ProductCacheCoordinator {
        ProductCacheCoordinator::new(
            self.config.clone(),
            self.context.clone(),
            ProductStore::new(),
            self.repository.clone(),
            self.reconciler.clone(),
        )
    }

    pub fn shown_ids(&self) -> Vec<i64> {
        self.coordinator
            .store()
            .current_state()
            .products
            .iter()
            .map(|p| p.id)
            .collect()
    }
}
