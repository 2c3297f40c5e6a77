//! Application-scoped catalog context
//!
//! Holds the state that must outlive a single coordinator instance: the
//! product cache, the last category list, the filter record, the last API
//! search term, the search box term and the failure breaker. A host creates one context at startup
//! and hands it to every coordinator it builds; `reset` is the only way to
//! discard it short of dropping it.

use parking_lot::RwLock;
use shared::{Category, PageRequest, Product};
use tokio::sync::watch;

use crate::config::CatalogConfig;
use crate::coordinator::{FailureBreaker, FilterState};

/// Products accumulated across pagination fetches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCache {
    products: Vec<Product>,
    all_loaded_via_pagination: bool,
}

impl ProductCache {
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Whether the server has signalled end-of-data
    pub fn is_all_loaded(&self) -> bool {
        self.all_loaded_via_pagination
    }

    fn contains(&self, id: i64) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    /// Append a pagination page, skipping ids already cached
    ///
    /// A page shorter than requested marks the cache as complete. Returns the
    /// number of products appended.
    pub fn append_page(&mut self, page: PageRequest, products: &[Product]) -> usize {
        let before = self.products.len();
        for product in products {
            if !self.contains(product.id) {
                self.products.push(product.clone());
            }
        }
        if page.is_last_page(products.len()) {
            self.all_loaded_via_pagination = true;
        }
        self.products.len() - before
    }

    /// Cached slice for `page`, if the cache can answer it without the server
    pub fn window(&self, page: PageRequest) -> Option<Vec<Product>> {
        let end = page.offset + page.limit;
        if self.products.len() >= end {
            return Some(self.products[page.offset..end].to_vec());
        }
        if self.all_loaded_via_pagination {
            let start = page.offset.min(self.products.len());
            return Some(self.products[start..].to_vec());
        }
        None
    }

    /// Whether rows exist past `page`
    pub fn has_more_after(&self, page: PageRequest) -> bool {
        self.products.len() > page.offset + page.limit || !self.all_loaded_via_pagination
    }

    /// Replace a cached product in place
    pub fn replace(&mut self, product: &Product) -> bool {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => {
                *slot = product.clone();
                true
            }
            None => false,
        }
    }

    /// Remove a product deleted on the server
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        self.products.len() != before
    }

    /// Add a product created on the server
    ///
    /// Only a complete cache takes it; a partial one will see it through
    /// pagination.
    pub fn insert_created(&mut self, product: &Product) -> bool {
        if !self.all_loaded_via_pagination || self.contains(product.id) {
            return false;
        }
        self.products.push(product.clone());
        true
    }
}

/// Process-lifetime catalog state shared by coordinators
#[derive(Debug)]
pub struct CatalogContext {
    cache: RwLock<ProductCache>,
    categories: RwLock<Vec<Category>>,
    filter: RwLock<FilterState>,
    last_api_search: RwLock<Option<String>>,
    search_term: watch::Sender<String>,
    breaker: FailureBreaker,
    page_size: usize,
}

impl CatalogContext {
    pub fn new(config: &CatalogConfig) -> Self {
        let (search_term, _) = watch::channel(String::new());
        Self {
            cache: RwLock::new(ProductCache::default()),
            categories: RwLock::new(Vec::new()),
            filter: RwLock::new(FilterState::new(config.page_size)),
            last_api_search: RwLock::new(None),
            search_term,
            breaker: FailureBreaker::new(config.max_consecutive_failures),
            page_size: config.page_size,
        }
    }

    /// Discard everything: cache, filter, remembered search and breaker
    pub fn reset(&self) {
        *self.cache.write() = ProductCache::default();
        self.categories.write().clear();
        *self.filter.write() = FilterState::new(self.page_size);
        *self.last_api_search.write() = None;
        self.search_term.send_replace(String::new());
        self.breaker.reset();
        tracing::info!("Catalog context reset");
    }

    // ========== Cache ==========

    /// Snapshot of the cache
    pub fn cache(&self) -> ProductCache {
        self.cache.read().clone()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_all_loaded(&self) -> bool {
        self.cache.read().is_all_loaded()
    }

    pub(crate) fn with_cache<R>(&self, f: impl FnOnce(&ProductCache) -> R) -> R {
        f(&self.cache.read())
    }

    pub(crate) fn with_cache_mut<R>(&self, f: impl FnOnce(&mut ProductCache) -> R) -> R {
        f(&mut self.cache.write())
    }

    /// Categories from the last successful initialize
    pub fn categories(&self) -> Vec<Category> {
        self.categories.read().clone()
    }

    pub(crate) fn set_categories(&self, categories: Vec<Category>) {
        *self.categories.write() = categories;
    }

    // ========== Filter ==========

    pub fn filter(&self) -> FilterState {
        self.filter.read().clone()
    }

    pub(crate) fn set_filter(&self, filter: FilterState) {
        *self.filter.write() = filter;
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ========== Search ==========

    pub fn last_api_search(&self) -> Option<String> {
        self.last_api_search.read().clone()
    }

    pub(crate) fn set_last_api_search(&self, term: Option<String>) {
        *self.last_api_search.write() = term;
    }

    /// Term shown in the search box
    pub fn search_term(&self) -> String {
        self.search_term.borrow().clone()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.search_term.send_if_modified(|current| {
            if *current == term {
                return false;
            }
            *current = term;
            true
        });
    }

    pub fn subscribe_search_term(&self) -> watch::Receiver<String> {
        self.search_term.subscribe()
    }

    // ========== Breaker ==========

    pub fn breaker(&self) -> &FailureBreaker {
        &self.breaker
    }
}
