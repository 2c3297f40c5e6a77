//! Filter state and the search predicate

use shared::{PageRequest, Product};

/// Where a search is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Pull the whole catalog from the server, then filter
    #[default]
    Api,
    /// Filter the in-memory cache only
    Local,
}

/// Current filter/pagination intent
///
/// Replaced wholesale on every intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub category_id: Option<i64>,
    pub limit: usize,
    pub offset: usize,
    pub search_mode: SearchMode,
}

impl FilterState {
    /// Default filter: no search, no category, first page
    pub fn new(limit: usize) -> Self {
        Self {
            search_term: String::new(),
            category_id: None,
            limit,
            offset: 0,
            search_mode: SearchMode::Api,
        }
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.limit, self.offset)
    }

    pub fn is_search(&self) -> bool {
        !self.search_term.is_empty()
    }
}

/// Decide how a search for `term` is served
///
/// Local only when the cache holds the whole catalog and `term` is exactly the
/// term of the previous API search. Any other term goes to the API again,
/// even if an earlier API search already completed the cache.
pub fn decide_search_mode(term: &str, all_loaded: bool, last_api_search: Option<&str>) -> SearchMode {
    if all_loaded && last_api_search == Some(term) {
        SearchMode::Local
    } else {
        SearchMode::Api
    }
}

/// Case-insensitive substring match over title, description, price and category name
///
/// `term_lower` must already be lowercase.
pub fn product_matches(product: &Product, term_lower: &str) -> bool {
    product.title.to_lowercase().contains(term_lower)
        || product.description.to_lowercase().contains(term_lower)
        || product.price.to_string().contains(term_lower)
        || product.category.name.to_lowercase().contains(term_lower)
}

/// Products matching `term`, in cache order
pub fn filter_products(products: &[Product], term: &str) -> Vec<Product> {
    let term_lower = term.to_lowercase();
    products
        .iter()
        .filter(|p| product_matches(p, &term_lower))
        .cloned()
        .collect()
}
