//! Data models
//!
//! Wire types of the storefront REST API plus the backup dataset rows.
//! All IDs are `i64`.

pub mod backup;
pub mod category;
pub mod product;

// Re-exports
pub use backup::*;
pub use category::*;
pub use product::*;
