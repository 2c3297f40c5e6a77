//! Shared types for the storefront catalog
//!
//! Wire models of the product API, backup dataset rows and the
//! pagination helper used by both the client and the catalog core.

pub mod models;
pub mod page;

// Re-exports
pub use models::{
    BackupCategory, BackupData, BackupProduct, Category, CategoryCreate, CategoryUpdate, Product,
    ProductCreate, ProductUpdate,
};
pub use page::PageRequest;
pub use serde::{Deserialize, Serialize};
