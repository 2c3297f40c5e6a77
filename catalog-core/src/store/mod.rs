//! Product Store
//!
//! Single source of observable truth for the displayable product and
//! category lists. Pure state container: no I/O, no async work. The
//! coordinator pushes into it; views subscribe to it.

mod selector;
mod state;

pub use selector::Selector;
pub use state::{
    ALL_PRODUCTS_LABEL, PaginationInfo, PaginationPatch, ProductViewState, ProductsView,
};

use std::sync::Arc;

use shared::{Category, Product};
use tokio::sync::watch;

/// Observable product view state
#[derive(Debug, Clone)]
pub struct ProductStore {
    state: Arc<watch::Sender<ProductViewState>>,
}

impl ProductStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ProductViewState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Apply `f` to a copy of the state and publish it only if it changed
    fn update(&self, f: impl FnOnce(&mut ProductViewState)) -> bool {
        self.state.send_if_modified(|current| {
            let mut next = current.clone();
            f(&mut next);
            if next == *current {
                tracing::trace!("Store: state unchanged, skipping update");
                return false;
            }
            *current = next;
            true
        })
    }

    // ========== Snapshots & subscriptions ==========

    /// Synchronous snapshot of the whole state
    pub fn current_state(&self) -> ProductViewState {
        self.state.borrow().clone()
    }

    /// Raw subscription to the whole state record
    pub fn subscribe(&self) -> watch::Receiver<ProductViewState> {
        self.state.subscribe()
    }

    pub fn products(&self) -> Selector<Vec<Product>> {
        Selector::new(self.subscribe(), |s| s.products.clone())
    }

    pub fn current_product(&self) -> Selector<Option<Product>> {
        Selector::new(self.subscribe(), |s| s.current_product.clone())
    }

    pub fn categories(&self) -> Selector<Vec<Category>> {
        Selector::new(self.subscribe(), |s| s.categories.clone())
    }

    pub fn selected_category(&self) -> Selector<Option<Category>> {
        Selector::new(self.subscribe(), |s| s.selected_category.clone())
    }

    pub fn loading(&self) -> Selector<bool> {
        Selector::new(self.subscribe(), |s| s.loading)
    }

    pub fn loading_products(&self) -> Selector<bool> {
        Selector::new(self.subscribe(), |s| s.loading_products)
    }

    pub fn loading_categories(&self) -> Selector<bool> {
        Selector::new(self.subscribe(), |s| s.loading_categories)
    }

    pub fn pagination(&self) -> Selector<PaginationInfo> {
        Selector::new(self.subscribe(), |s| s.pagination.clone())
    }

    pub fn error(&self) -> Selector<Option<String>> {
        Selector::new(self.subscribe(), |s| s.error.clone())
    }

    /// Combined list view: products, loading flag, category label, error
    pub fn products_view(&self) -> Selector<ProductsView> {
        Selector::new(self.subscribe(), ProductsView::from_state)
    }

    // ========== Products ==========

    pub fn set_products(&self, products: Vec<Product>) {
        self.update(|s| s.products = products);
    }

    /// Append a page to the displayed products
    pub fn add_products(&self, products: Vec<Product>) {
        if products.is_empty() {
            return;
        }
        self.update(|s| s.products.extend(products));
    }

    pub fn clear_products(&self) {
        self.update(|s| s.products.clear());
    }

    pub fn add_product(&self, product: Product) {
        self.update(|s| s.products.push(product));
    }

    /// Replace the product with the same id, including the current product
    pub fn update_product(&self, product: Product) {
        self.update(|s| {
            if let Some(slot) = s.products.iter_mut().find(|p| p.id == product.id) {
                *slot = product.clone();
            }
            if s.current_product.as_ref().is_some_and(|p| p.id == product.id) {
                s.current_product = Some(product);
            }
        });
    }

    pub fn delete_product(&self, product_id: i64) {
        self.update(|s| {
            s.products.retain(|p| p.id != product_id);
            if s.current_product.as_ref().is_some_and(|p| p.id == product_id) {
                s.current_product = None;
            }
        });
    }

    pub fn set_current_product(&self, product: Option<Product>) {
        self.update(|s| s.current_product = product);
    }

    // ========== Categories ==========

    /// Replace the category list, dropping duplicate ids
    pub fn set_categories(&self, categories: Vec<Category>) {
        let mut unique: Vec<Category> = Vec::with_capacity(categories.len());
        for category in categories {
            if !unique.iter().any(|c| c.id == category.id) {
                unique.push(category);
            }
        }
        self.update(|s| s.categories = unique);
    }

    pub fn select_category(&self, category: Option<Category>) {
        self.update(|s| s.selected_category = category);
    }

    /// Look up a known category by id
    pub fn find_category(&self, id: i64) -> Option<Category> {
        self.state.borrow().categories.iter().find(|c| c.id == id).cloned()
    }

    // ========== Flags ==========

    pub fn set_loading(&self, loading: bool) {
        self.update(|s| s.loading = loading);
    }

    pub fn set_loading_products(&self, loading: bool) {
        self.update(|s| s.loading_products = loading);
    }

    pub fn set_loading_categories(&self, loading: bool) {
        self.update(|s| s.loading_categories = loading);
    }

    pub fn update_pagination(&self, patch: PaginationPatch) {
        self.update(|s| {
            let p = &mut s.pagination;
            p.limit = patch.limit.unwrap_or(p.limit);
            p.offset = patch.offset.unwrap_or(p.offset);
            p.total = patch.total.unwrap_or(p.total);
            p.has_more = patch.has_more.unwrap_or(p.has_more);
        });
    }

    /// Whether the last fetch reported more rows
    pub fn has_more(&self) -> bool {
        self.state.borrow().pagination.has_more
    }

    // ========== Errors ==========

    /// Set or clear the error; setting the current value again is a no-op
    pub fn set_error(&self, error: Option<String>) {
        if self.state.borrow().error == error {
            return;
        }
        if let Some(message) = &error {
            tracing::debug!(error = %message, "Store: setting error");
        }
        self.update(|s| s.error = error);
    }

    /// Back to the initial state
    pub fn reset_state(&self) {
        self.update(|s| *s = ProductViewState::default());
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}
