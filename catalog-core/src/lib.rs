//! Catalog Core - product cache and pagination/search state machine
//!
//! - [`ProductStore`]: observable view state, no I/O
//! - [`ProductCacheCoordinator`]: filter state machine, cache and fetch pipeline
//! - [`CatalogContext`]: cache and filter state that outlives a coordinator
//! - [`DataRecoveryService`]: repairs the remote catalog from the backup dataset

pub mod config;
pub mod context;
pub mod coordinator;
pub mod logger;
pub mod recovery;
pub mod store;

pub use config::CatalogConfig;
pub use context::{CatalogContext, ProductCache};
pub use coordinator::{CRITICAL_ERROR, FailureBreaker, FilterState, ProductCacheCoordinator, SearchMode};
pub use recovery::{BackupDataset, BackupReconciler, DataRecoveryService, RecoveryError, RecoveryOutcome};
pub use store::{PaginationInfo, ProductStore, ProductViewState, ProductsView, Selector};
