//! Intent pipeline
//!
//! Background task owning the debounce window and the single active fetch.
//! A newer intent arriving while a fetch is in flight drops that fetch
//! (cancel-and-restart); results are applied only when their sequence number
//! is still the latest issued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use catalog_client::{ClientError, ClientResult, ProductRepository};
use shared::{PageRequest, Product};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::filter::{FilterState, SearchMode, filter_products};
use crate::config::CatalogConfig;
use crate::context::CatalogContext;
use crate::recovery::BackupReconciler;
use crate::store::{PaginationPatch, ProductStore};

/// Error shown once the breaker has tripped
pub const CRITICAL_ERROR: &str =
    "Too many consecutive errors. Run data recovery to reload the catalog.";

/// A filter submitted to the pipeline
#[derive(Debug, Clone)]
pub(super) struct Intent {
    pub seq: u64,
    pub filter: FilterState,
}

/// What a fetch produced, before it is applied
enum Fetched {
    /// Search answered from the cache
    Local,
    /// Full-catalog pull for an API search
    Catalog { page: PageRequest, products: Vec<Product> },
    /// Browse page answered from the cache
    Cached { products: Vec<Product>, has_more: bool },
    /// Browse page from the server
    Page { page: PageRequest, products: Vec<Product> },
    /// Category-scoped page from the server, never cached
    Category { page: PageRequest, products: Vec<Product> },
}

/// State shared by the coordinator handle and its pipeline task
pub(super) struct Shared {
    pub config: CatalogConfig,
    pub context: Arc<CatalogContext>,
    pub store: ProductStore,
    pub repository: Arc<dyn ProductRepository>,
    pub recovery: Arc<dyn BackupReconciler>,
    issued: AtomicU64,
    settled: watch::Sender<u64>,
    fetching: AtomicBool,
}

impl Shared {
    pub fn new(
        config: CatalogConfig,
        context: Arc<CatalogContext>,
        store: ProductStore,
        repository: Arc<dyn ProductRepository>,
        recovery: Arc<dyn BackupReconciler>,
    ) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            config,
            context,
            store,
            repository,
            recovery,
            issued: AtomicU64::new(0),
            settled,
            fetching: AtomicBool::new(false),
        }
    }

    /// Issue a new sequence number, invalidating every earlier one
    pub fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn mark_settled(&self, seq: u64) {
        self.settled.send_if_modified(|current| {
            if seq > *current {
                *current = seq;
                true
            } else {
                false
            }
        });
    }

    pub fn subscribe_settled(&self) -> watch::Receiver<u64> {
        self.settled.subscribe()
    }

    /// A fetch is running or an issued intent has not been applied yet
    pub fn is_loading(&self) -> bool {
        self.fetching.load(Ordering::SeqCst) || self.issued() > *self.settled.borrow()
    }

    pub fn failure_message(&self, e: &ClientError) -> String {
        if self.context.breaker().is_tripped() {
            CRITICAL_ERROR.to_string()
        } else {
            format!("Failed to load products: {e}")
        }
    }

    async fn execute(&self, intent: &Intent) {
        let filter = &intent.filter;
        tracing::debug!(
            seq = intent.seq,
            term = %filter.search_term,
            category_id = ?filter.category_id,
            offset = filter.offset,
            mode = ?filter.search_mode,
            "Executing intent"
        );

        let result = {
            let _guard = FetchGuard::begin(self);
            self.fetch(filter).await
        };

        if intent.seq != self.issued() {
            tracing::debug!(seq = intent.seq, latest = self.issued(), "Discarding stale result");
            return;
        }

        match result {
            Ok(fetched) => self.apply(filter, fetched),
            Err(e) => self.apply_failure(filter, &e),
        }
        self.mark_settled(intent.seq);
    }

    async fn fetch(&self, filter: &FilterState) -> ClientResult<Fetched> {
        if filter.is_search() {
            // A reset since the decision leaves the cache incomplete
            if filter.search_mode == SearchMode::Local && self.context.is_all_loaded() {
                return Ok(Fetched::Local);
            }
            let page = PageRequest::first(self.config.search_page_size);
            let products = self.repository.get_products(page).await?;
            return Ok(Fetched::Catalog { page, products });
        }

        let page = filter.page();
        if let Some(category_id) = filter.category_id {
            let products = self
                .repository
                .get_products_by_category(category_id, page)
                .await?;
            return Ok(Fetched::Category { page, products });
        }

        let cached = self
            .context
            .with_cache(|cache| cache.window(page).map(|products| (products, cache.has_more_after(page))));
        if let Some((products, has_more)) = cached {
            tracing::debug!(offset = page.offset, count = products.len(), "Cache hit");
            return Ok(Fetched::Cached { products, has_more });
        }

        let products = self.repository.get_products(page).await?;
        Ok(Fetched::Page { page, products })
    }

    fn apply(&self, filter: &FilterState, fetched: Fetched) {
        let (products, has_more) = match fetched {
            Fetched::Local => {
                let shown = self
                    .context
                    .with_cache(|cache| filter_products(cache.products(), &filter.search_term));
                tracing::debug!(term = %filter.search_term, matches = shown.len(), "Local search");
                (shown, false)
            }
            Fetched::Catalog { page, products } => {
                let added = self
                    .context
                    .with_cache_mut(|cache| cache.append_page(page, &products));
                self.context
                    .set_last_api_search(Some(filter.search_term.clone()));
                let shown = self
                    .context
                    .with_cache(|cache| filter_products(cache.products(), &filter.search_term));
                tracing::debug!(
                    term = %filter.search_term,
                    fetched = products.len(),
                    added,
                    matches = shown.len(),
                    "API search"
                );
                (shown, false)
            }
            Fetched::Cached { products, has_more } => (products, has_more),
            Fetched::Page { page, products } => {
                let has_more = !page.is_last_page(products.len());
                self.context
                    .with_cache_mut(|cache| cache.append_page(page, &products));
                (products, has_more)
            }
            Fetched::Category { page, products } => {
                let has_more = !page.is_last_page(products.len());
                (products, has_more)
            }
        };

        if filter.offset == 0 {
            self.store.set_products(products);
        } else {
            self.store.add_products(products);
        }
        let total = self.store.current_state().products.len();
        self.store.update_pagination(PaginationPatch {
            limit: Some(filter.limit),
            offset: Some(filter.offset),
            total: Some(total),
            has_more: Some(has_more),
        });

        self.context.breaker().record_success();
        self.store.set_error(None);
    }

    fn apply_failure(&self, filter: &FilterState, e: &ClientError) {
        let failures = self.context.breaker().record_failure();
        tracing::error!(
            error = %e,
            status = ?e.status(),
            failures,
            threshold = self.context.breaker().threshold(),
            "Product fetch failed"
        );

        if filter.offset == 0 {
            self.store.set_products(Vec::new());
            self.store.update_pagination(PaginationPatch {
                offset: Some(0),
                total: Some(0),
                has_more: Some(false),
                ..Default::default()
            });
        } else {
            // Keep the page retryable
            let mut reverted = filter.clone();
            reverted.offset = filter.offset.saturating_sub(filter.limit);
            self.context.set_filter(reverted);
        }

        self.store.set_error(Some(self.failure_message(e)));
    }
}

/// Marks a fetch in flight; cleared on completion or cancellation
struct FetchGuard<'a> {
    shared: &'a Shared,
}

impl<'a> FetchGuard<'a> {
    fn begin(shared: &'a Shared) -> Self {
        shared.fetching.store(true, Ordering::SeqCst);
        shared.store.set_loading_products(true);
        Self { shared }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.shared.fetching.store(false, Ordering::SeqCst);
        self.shared.store.set_loading_products(false);
    }
}

/// Pipeline loop; exits on shutdown or when the coordinator is dropped
pub(super) async fn run(
    shared: Arc<Shared>,
    mut intents: watch::Receiver<Option<Intent>>,
    shutdown: CancellationToken,
) {
    let debounce = shared.config.debounce();
    let mut restarted = false;
    tracing::debug!(debounce_ms = debounce.as_millis() as u64, "Intent pipeline started");

    loop {
        if !restarted {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = intents.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        restarted = false;

        // Every change restarts the window
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                changed = intents.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        let latest = intents.borrow_and_update().clone();
        let Some(intent) = latest else {
            continue;
        };
        if intent.seq != shared.issued() {
            tracing::debug!(seq = intent.seq, "Intent superseded before execution");
            continue;
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = shared.execute(&intent) => {}
            changed = intents.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::debug!(seq = intent.seq, "Newer intent arrived, cancelling in-flight fetch");
                restarted = true;
            }
        }
    }

    tracing::debug!("Intent pipeline stopped");
}
