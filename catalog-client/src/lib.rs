//! Catalog Client - HTTP client for the storefront API
//!
//! Provides the network leaf of the catalog: raw JSON requests through
//! [`HttpClient`] and the page-oriented [`ProductRepository`] on top of it.

pub mod config;
pub mod error;
pub mod http;
pub mod repository;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use repository::{HttpProductRepository, ProductRepository};

// Re-export shared types for convenience
pub use shared::{Category, CategoryCreate, CategoryUpdate, PageRequest, Product, ProductCreate, ProductUpdate};
