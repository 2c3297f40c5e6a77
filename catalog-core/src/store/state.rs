//! Store state record

use shared::{Category, Product};

/// Label shown when no category is selected
pub const ALL_PRODUCTS_LABEL: &str = "All products";

/// Pagination info mirrored for the view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationInfo {
    /// Zero until the owning coordinator sets its page size
    pub limit: usize,
    pub offset: usize,
    /// Rows currently displayed
    pub total: usize,
    /// False once the last fetch returned a short page
    pub has_more: bool,
}

/// Partial pagination update; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationPatch {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub total: Option<usize>,
    pub has_more: Option<bool>,
}

/// Whole observable state of the product view
///
/// Replaced as a unit on every mutation; observers are only notified when the
/// new record differs from the old one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductViewState {
    /// Display set pushed by the coordinator
    pub products: Vec<Product>,
    pub current_product: Option<Product>,

    pub categories: Vec<Category>,
    pub selected_category: Option<Category>,

    pub loading: bool,
    pub loading_products: bool,
    pub loading_categories: bool,

    pub pagination: PaginationInfo,

    pub error: Option<String>,
}

/// Combined projection for a product list view
#[derive(Debug, Clone, PartialEq)]
pub struct ProductsView {
    pub products: Vec<Product>,
    pub loading: bool,
    /// Selected category name, or [`ALL_PRODUCTS_LABEL`]
    pub category: String,
    pub error: Option<String>,
    pub is_empty: bool,
}

impl ProductsView {
    pub fn from_state(state: &ProductViewState) -> Self {
        Self {
            products: state.products.clone(),
            loading: state.loading_products,
            category: state
                .selected_category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| ALL_PRODUCTS_LABEL.to_string()),
            error: state.error.clone(),
            is_empty: !state.loading_products && state.products.is_empty(),
        }
    }
}
