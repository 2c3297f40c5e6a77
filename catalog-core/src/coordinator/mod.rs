//! Product Cache Coordinator
//!
//! Serves product data for any search / category / pagination combination
//! while keeping network calls down:
//!
//! - browse pages are answered from the [`ProductCache`](crate::context::ProductCache)
//!   whenever it already holds them
//! - a search pulls the whole catalog once, then filters locally while the
//!   same term is repeated
//! - category pages always come from the server
//!
//! Intent methods (`search`, `select_category`, `load_more`,
//! `clear_all_filters`) only update the filter and submit it; a background
//! pipeline debounces submissions, runs at most one fetch at a time and
//! pushes results into the [`ProductStore`].

mod breaker;
mod filter;
mod pipeline;

pub use breaker::FailureBreaker;
pub use filter::{FilterState, SearchMode, decide_search_mode, filter_products, product_matches};
pub use pipeline::CRITICAL_ERROR;

use std::sync::Arc;

use catalog_client::{ClientResult, HttpProductRepository, ProductRepository};
use shared::{PageRequest, Product, ProductCreate, ProductUpdate};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::CatalogConfig;
use crate::context::CatalogContext;
use crate::recovery::{BackupReconciler, DataRecoveryService};
use crate::store::{PaginationPatch, ProductStore};
use pipeline::{Intent, Shared};

/// Minimum term length for a results count
const MIN_COUNT_TERM_LEN: usize = 2;

pub struct ProductCacheCoordinator {
    shared: Arc<Shared>,
    intents: watch::Sender<Option<Intent>>,
    shutdown: CancellationToken,
}

impl ProductCacheCoordinator {
    /// Build a coordinator and spawn its pipeline
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: CatalogConfig,
        context: Arc<CatalogContext>,
        store: ProductStore,
        repository: Arc<dyn ProductRepository>,
        recovery: Arc<dyn BackupReconciler>,
    ) -> Self {
        store.update_pagination(PaginationPatch {
            limit: Some(config.page_size),
            ..Default::default()
        });
        let shared = Arc::new(Shared::new(config, context, store, repository, recovery));
        let (intents, rx) = watch::channel(None);
        let shutdown = CancellationToken::new();

        tokio::spawn(pipeline::run(shared.clone(), rx, shutdown.clone()));

        Self {
            shared,
            intents,
            shutdown,
        }
    }

    /// HTTP repository plus the backup reconciler, with a fresh context and store
    pub fn from_config(config: CatalogConfig) -> ClientResult<Self> {
        let repository: Arc<dyn ProductRepository> =
            Arc::new(HttpProductRepository::from_config(&config.client_config())?);
        let recovery = Arc::new(DataRecoveryService::from_config(repository.clone(), &config));
        let context = Arc::new(CatalogContext::new(&config));
        Ok(Self::new(config, context, ProductStore::new(), repository, recovery))
    }

    pub fn store(&self) -> &ProductStore {
        &self.shared.store
    }

    pub fn context(&self) -> &Arc<CatalogContext> {
        &self.shared.context
    }

    pub fn filter_state(&self) -> FilterState {
        self.shared.context.filter()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.is_loading()
    }

    // ========== Lifecycle ==========

    /// Reconcile the backup, then load the first page and the categories
    ///
    /// Once the cache holds the whole catalog the remembered filter is shown
    /// straight from it. A remembered search or category is resubmitted after
    /// the first page lands; use [`Self::wait_until_settled`] to observe it.
    /// Failures surface through the store error.
    pub async fn initialize(&self) -> bool {
        let shared = &self.shared;
        let context = &shared.context;
        let store = &shared.store;

        if context.is_all_loaded() {
            self.restore_from_cache();
            return true;
        }

        let outcome = shared.recovery.reconcile().await;
        if outcome.success {
            tracing::info!(message = %outcome.message, "Backup reconciliation finished");
        } else {
            tracing::warn!(message = %outcome.message, "Backup reconciliation failed");
        }

        let remembered = context.filter();
        let seq = shared.next_seq();
        let filter = FilterState::new(context.page_size());
        context.set_filter(filter.clone());
        let page = filter.page();

        store.set_loading(true);
        store.set_loading_products(true);
        store.set_loading_categories(true);

        let (products, categories) = tokio::join!(
            shared.repository.get_products(page),
            shared.repository.get_categories(shared.config.category_limit),
        );

        let mut failure = None;

        match categories {
            Ok(categories) => {
                tracing::debug!(count = categories.len(), "Categories loaded");
                context.set_categories(categories.clone());
                store.set_categories(categories);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load categories");
                failure = Some(e);
            }
        }

        let current = seq == shared.issued();
        match products {
            Ok(products) if current => {
                let has_more = !page.is_last_page(products.len());
                context.with_cache_mut(|cache| cache.append_page(page, &products));
                let total = products.len();
                store.set_products(products);
                store.update_pagination(PaginationPatch {
                    limit: Some(page.limit),
                    offset: Some(0),
                    total: Some(total),
                    has_more: Some(has_more),
                });
            }
            Ok(_) => tracing::debug!(seq, "Initial page superseded by a newer intent"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load initial products");
                if current {
                    store.set_products(Vec::new());
                    store.update_pagination(PaginationPatch {
                        has_more: Some(false),
                        ..Default::default()
                    });
                }
                failure = Some(e);
            }
        }

        store.set_loading_categories(false);
        store.set_loading_products(false);
        store.set_loading(false);

        let success = match failure {
            None => {
                context.breaker().record_success();
                store.set_error(None);
                true
            }
            Some(e) => {
                context.breaker().record_failure();
                store.set_error(Some(shared.failure_message(&e)));
                false
            }
        };

        shared.mark_settled(seq);
        tracing::info!(success, cached = context.cache_len(), "Catalog initialized");

        if success && seq == shared.issued() {
            self.resume(remembered);
        }
        success
    }

    /// Resubmit a search or category filter that outlived the previous view
    ///
    /// The search box text is left as it is.
    fn resume(&self, remembered: FilterState) {
        if !remembered.is_search() && remembered.category_id.is_none() {
            return;
        }
        let context = &self.shared.context;
        let store = &self.shared.store;

        let mut filter = FilterState {
            offset: 0,
            ..remembered
        };
        if filter.is_search() {
            let last = context.last_api_search();
            filter.search_mode =
                decide_search_mode(&filter.search_term, context.is_all_loaded(), last.as_deref());
        }

        tracing::debug!(
            term = %filter.search_term,
            category_id = ?filter.category_id,
            "Resuming remembered filter"
        );
        store.select_category(filter.category_id.and_then(|id| store.find_category(id)));
        self.submit(filter);
    }

    /// Show the remembered filter from a complete cache
    fn restore_from_cache(&self) {
        let shared = &self.shared;
        let context = &shared.context;
        let store = &shared.store;

        let seq = shared.next_seq();
        let filter = context.filter();

        store.set_categories(context.categories());
        store.set_error(None);

        if let Some(category_id) = filter.category_id {
            // Category pages are never cached
            store.select_category(store.find_category(category_id));
            shared.mark_settled(seq);
            if !self.reject_if_tripped("restore category") {
                self.submit(FilterState { offset: 0, ..filter });
            }
            return;
        }
        store.select_category(None);

        let (products, has_more) = if filter.is_search() {
            let shown = context.with_cache(|cache| filter_products(cache.products(), &filter.search_term));
            (shown, false)
        } else {
            // Every page browsed so far
            let shown = PageRequest::first(filter.offset + filter.limit);
            context.with_cache(|cache| {
                (cache.window(shown).unwrap_or_default(), cache.has_more_after(shown))
            })
        };
        let total = products.len();

        store.set_products(products);
        store.update_pagination(PaginationPatch {
            limit: Some(filter.limit),
            offset: Some(filter.offset),
            total: Some(total),
            has_more: Some(has_more),
        });

        shared.mark_settled(seq);
        tracing::debug!(
            cached = context.cache_len(),
            term = %filter.search_term,
            "Catalog already loaded, restored from cache"
        );
    }

    /// Discard the cache, rerun backup reconciliation and initialize again
    pub async fn force_data_recovery(&self) -> bool {
        tracing::info!("Forcing data recovery");
        let shared = &self.shared;

        shared.next_seq();
        self.intents.send_replace(None);

        shared.context.reset();
        shared.store.clear_products();
        shared.store.select_category(None);
        shared.store.set_error(None);
        shared.store.update_pagination(PaginationPatch {
            offset: Some(0),
            total: Some(0),
            has_more: Some(false),
            ..Default::default()
        });
        shared.recovery.reset();

        self.initialize().await
    }

    /// Wait until the latest issued intent has been applied
    pub async fn wait_until_settled(&self) {
        let target = self.shared.issued();
        let mut settled = self.shared.subscribe_settled();
        tokio::select! {
            _ = settled.wait_for(|seq| *seq >= target) => {}
            _ = self.shutdown.cancelled() => {}
        }
    }

    /// Stop the pipeline; intents submitted afterwards are never executed
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    // ========== Intents ==========

    /// Search by `term`; a blank term clears all filters
    pub fn search(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.clear_all_filters();
            return;
        }
        if self.reject_if_tripped("search") {
            return;
        }

        let context = &self.shared.context;
        let last = context.last_api_search();
        let mode = decide_search_mode(term, context.is_all_loaded(), last.as_deref());
        let filter = FilterState {
            search_term: term.to_string(),
            category_id: None,
            offset: 0,
            search_mode: mode,
            ..context.filter()
        };

        tracing::debug!(term, ?mode, "Search");
        context.set_search_term(term);
        self.shared.store.select_category(None);
        self.submit(filter);
    }

    /// Filter by category; selecting the active category again deselects it
    pub fn select_category(&self, category_id: Option<i64>) {
        if self.reject_if_tripped("select category") {
            return;
        }

        let context = &self.shared.context;
        let current = context.filter();
        let next = match category_id {
            Some(id) if current.category_id == Some(id) => None,
            other => other,
        };
        let filter = FilterState {
            category_id: next,
            ..FilterState::new(current.limit)
        };

        tracing::debug!(category_id = ?next, "Select category");
        context.set_search_term("");
        let store = &self.shared.store;
        store.select_category(next.and_then(|id| store.find_category(id)));
        self.submit(filter);
    }

    /// Next page of the current filter
    ///
    /// No-op while a fetch is pending or when the last fetch reported no more rows.
    pub fn load_more(&self) {
        if self.reject_if_tripped("load more") {
            return;
        }
        if self.shared.is_loading() {
            tracing::debug!("Load more ignored, fetch in progress");
            return;
        }
        if !self.shared.store.has_more() {
            tracing::debug!("Load more ignored, no more products");
            return;
        }

        let mut filter = self.shared.context.filter();
        filter.offset += filter.limit;
        tracing::debug!(offset = filter.offset, "Load more");
        self.submit(filter);
    }

    /// Back to the default filter; the cache is kept
    pub fn clear_all_filters(&self) {
        let context = &self.shared.context;
        let filter = FilterState::new(context.page_size());
        context.set_search_term("");
        self.shared.store.select_category(None);

        if context.breaker().is_tripped() {
            tracing::warn!("Filters cleared without reload, too many consecutive failures");
            context.set_filter(filter);
            return;
        }
        self.submit(filter);
    }

    fn submit(&self, filter: FilterState) {
        let seq = self.shared.next_seq();
        self.shared.context.set_filter(filter.clone());
        self.intents.send_replace(Some(Intent { seq, filter }));
    }

    fn reject_if_tripped(&self, intent: &str) -> bool {
        let breaker = self.shared.context.breaker();
        if !breaker.is_tripped() {
            return false;
        }
        tracing::warn!(
            intent,
            failures = breaker.failures(),
            "Intent rejected, too many consecutive failures"
        );
        self.shared.store.set_error(Some(CRITICAL_ERROR.to_string()));
        true
    }

    // ========== Search box ==========

    pub fn current_search_term(&self) -> String {
        self.shared.context.search_term()
    }

    /// Set the search box text without running a search
    pub fn set_current_search_term(&self, term: &str) {
        self.shared.context.set_search_term(term);
    }

    pub fn subscribe_search_term(&self) -> watch::Receiver<String> {
        self.shared.context.subscribe_search_term()
    }

    /// Number of shown products for the active search
    ///
    /// `None` when no search with at least two characters is active.
    pub fn search_results_count(&self) -> Option<usize> {
        let term = self.shared.context.filter().search_term;
        if term.chars().count() < MIN_COUNT_TERM_LEN {
            return None;
        }
        Some(self.shared.store.current_state().products.len())
    }

    // ========== Admin mutations ==========

    pub async fn create_product(&self, data: &ProductCreate) -> Option<Product> {
        match self.shared.repository.create_product(data).await {
            Ok(product) => {
                tracing::info!(id = product.id, title = %product.title, "Product created");
                self.shared
                    .context
                    .with_cache_mut(|cache| cache.insert_created(&product));
                self.shared.store.add_product(product.clone());
                Some(product)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create product");
                self.shared
                    .store
                    .set_error(Some(format!("Failed to create product: {e}")));
                None
            }
        }
    }

    pub async fn update_product(&self, id: i64, data: &ProductUpdate) -> Option<Product> {
        match self.shared.repository.update_product(id, data).await {
            Ok(product) => {
                tracing::info!(id, "Product updated");
                self.shared
                    .context
                    .with_cache_mut(|cache| cache.replace(&product));
                self.shared.store.update_product(product.clone());
                Some(product)
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to update product");
                self.shared
                    .store
                    .set_error(Some(format!("Failed to update product: {e}")));
                None
            }
        }
    }

    pub async fn delete_product(&self, id: i64) -> bool {
        match self.shared.repository.delete_product(id).await {
            Ok(true) => {
                tracing::info!(id, "Product deleted");
                self.shared.context.with_cache_mut(|cache| cache.remove(id));
                self.shared.store.delete_product(id);
                true
            }
            Ok(false) => {
                tracing::warn!(id, "Server refused to delete product");
                false
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to delete product");
                self.shared
                    .store
                    .set_error(Some(format!("Failed to delete product: {e}")));
                false
            }
        }
    }
}

impl Drop for ProductCacheCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
