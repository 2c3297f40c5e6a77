//! Data Recovery Service
//!
//! Compares the static backup dataset with the live API and, when any backup
//! category or product is missing remotely, replaces the remote catalog
//! wholesale: delete every category and recreate them, then delete every
//! product and recreate them with category ids remapped through the new
//! categories.
//!
//! Runs at most once per process unless [`BackupReconciler::reset`] is called.

mod backup;

pub use backup::{BackupDataset, PLACEHOLDER_IMAGE, fallback_categories, fallback_products, parse_images};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog_client::{ClientResult, ProductRepository};
use futures::future::join_all;
use serde::Serialize;
use shared::{
    BackupCategory, BackupData, BackupProduct, Category, CategoryCreate, PageRequest, Product,
    ProductCreate,
};
use thiserror::Error;

use crate::config::CatalogConfig;

/// Rows inspected when checking the remote catalog
const CHECK_CATEGORY_LIMIT: usize = 100;
const CHECK_PRODUCT_LIMIT: usize = 100;
/// Rows deleted before recreating
const RESTORE_CATEGORY_LIMIT: usize = 100;
const RESTORE_PRODUCT_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid backup file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result of one reconciliation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryOutcome {
    pub success: bool,
    pub message: String,
}

impl RecoveryOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Bootstrap collaborator of the coordinator
#[async_trait]
pub trait BackupReconciler: Send + Sync {
    /// Check the remote catalog and repair it if needed
    async fn reconcile(&self) -> RecoveryOutcome;

    /// Allow the next `reconcile` to run again
    fn reset(&self);
}

/// Names of backup categories absent remotely (case-insensitive)
pub fn find_missing_categories(backup: &[BackupCategory], current: &[Category]) -> Vec<String> {
    backup
        .iter()
        .filter(|b| {
            !current
                .iter()
                .any(|c| c.name.to_lowercase() == b.name.to_lowercase())
        })
        .map(|b| b.name.clone())
        .collect()
}

/// Titles of backup products absent remotely (case-insensitive)
pub fn find_missing_products(backup: &[BackupProduct], current: &[Product]) -> Vec<String> {
    backup
        .iter()
        .filter(|b| {
            !current
                .iter()
                .any(|p| p.title.to_lowercase() == b.title.to_lowercase())
        })
        .map(|b| b.title.clone())
        .collect()
}

/// Backup reconciliation against a [`ProductRepository`]
pub struct DataRecoveryService {
    repository: Arc<dyn ProductRepository>,
    dataset: BackupDataset,
    timeout: Duration,
    initializing: AtomicBool,
    attempted: AtomicBool,
}

impl DataRecoveryService {
    pub fn new(repository: Arc<dyn ProductRepository>, dataset: BackupDataset, timeout: Duration) -> Self {
        Self {
            repository,
            dataset,
            timeout,
            initializing: AtomicBool::new(false),
            attempted: AtomicBool::new(false),
        }
    }

    pub fn from_config(repository: Arc<dyn ProductRepository>, config: &CatalogConfig) -> Self {
        Self::new(
            repository,
            BackupDataset::new(config.backup_dir.clone()),
            config.recovery_timeout(),
        )
    }

    pub fn was_attempted(&self) -> bool {
        self.attempted.load(Ordering::SeqCst)
    }

    async fn run(&self) -> RecoveryOutcome {
        let backup = self.dataset.load().await;

        let (categories, products) = tokio::join!(
            self.repository.get_categories(CHECK_CATEGORY_LIMIT),
            self.repository
                .get_products(PageRequest::first(CHECK_PRODUCT_LIMIT)),
        );
        let categories = or_empty(categories, "categories");
        let products = or_empty(products, "products");

        let missing_categories = find_missing_categories(&backup.categories, &categories);
        let missing_products = find_missing_products(&backup.products, &products);

        tracing::info!(
            current_categories = categories.len(),
            backup_categories = backup.categories.len(),
            current_products = products.len(),
            backup_products = backup.products.len(),
            missing_categories = missing_categories.len(),
            missing_products = missing_products.len(),
            "Catalog check finished"
        );

        if missing_categories.is_empty() && missing_products.is_empty() {
            return RecoveryOutcome::ok("Database is healthy");
        }

        tracing::warn!(?missing_categories, ?missing_products, "Catalog incomplete, restoring from backup");
        self.restore(&backup).await
    }

    async fn restore(&self, backup: &BackupData) -> RecoveryOutcome {
        let mapping = self.restore_categories(&backup.categories).await;
        let created = self.restore_products(&backup.products, &mapping).await;

        if created > 0 {
            RecoveryOutcome::ok(format!(
                "Restored {} categories and {} products",
                mapping.len(),
                created
            ))
        } else {
            RecoveryOutcome::failed("Failed to restore data from backup")
        }
    }

    /// Replace all categories; returns backup id -> new remote id
    async fn restore_categories(&self, backup: &[BackupCategory]) -> HashMap<String, i64> {
        let existing = or_empty(
            self.repository.get_categories(RESTORE_CATEGORY_LIMIT).await,
            "categories",
        );
        let deletes = existing.iter().map(|category| async move {
            if let Err(e) = self.repository.delete_category(category.id).await {
                tracing::warn!(category = %category.name, error = %e, "Could not delete category");
            }
        });
        join_all(deletes).await;

        let creates = backup.iter().map(|b| async move {
            let data = CategoryCreate {
                name: b.name.clone(),
                image: if b.image.is_empty() {
                    PLACEHOLDER_IMAGE.to_string()
                } else {
                    b.image.clone()
                },
            };
            match self.repository.create_category(&data).await {
                Ok(created) => {
                    tracing::debug!(name = %created.name, id = created.id, "Created category");
                    Some((b.id.to_string(), created.id))
                }
                Err(e) => {
                    tracing::error!(name = %b.name, error = %e, "Failed to create category");
                    None
                }
            }
        });

        let mapping: HashMap<String, i64> = join_all(creates).await.into_iter().flatten().collect();
        tracing::info!(created = mapping.len(), "Categories restored");
        mapping
    }

    /// Replace all products; returns the number created
    async fn restore_products(&self, backup: &[BackupProduct], mapping: &HashMap<String, i64>) -> usize {
        let existing = or_empty(
            self.repository
                .get_products(PageRequest::first(RESTORE_PRODUCT_LIMIT))
                .await,
            "products",
        );
        let deletes = existing.iter().map(|product| async move {
            if let Err(e) = self.repository.delete_product(product.id).await {
                tracing::warn!(product = %product.title, error = %e, "Could not delete product");
            }
        });
        join_all(deletes).await;

        let creates = backup.iter().map(|b| async move {
            let Some(&category_id) = mapping.get(&b.category_id) else {
                tracing::warn!(product = %b.title, category_id = %b.category_id, "No category mapping for product");
                return false;
            };
            let data = ProductCreate {
                title: b.title.clone(),
                price: b.price,
                description: b.description.clone(),
                category_id,
                images: parse_images(&b.images),
            };
            match self.repository.create_product(&data).await {
                Ok(created) => {
                    tracing::debug!(title = %created.title, id = created.id, "Created product");
                    true
                }
                Err(e) => {
                    tracing::error!(title = %b.title, error = %e, "Failed to create product");
                    false
                }
            }
        });

        let created = join_all(creates).await.into_iter().filter(|ok| *ok).count();
        tracing::info!(created, "Products restored");
        created
    }
}

#[async_trait]
impl BackupReconciler for DataRecoveryService {
    async fn reconcile(&self) -> RecoveryOutcome {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return if self.initializing.load(Ordering::SeqCst) {
                tracing::debug!("Data initialization already in progress");
                RecoveryOutcome::ok("Initialization in progress")
            } else {
                tracing::debug!("Data initialization already attempted");
                RecoveryOutcome::ok("Initialization already completed")
            };
        }

        self.initializing.store(true, Ordering::SeqCst);
        tracing::info!(dir = %self.dataset.dir().display(), "Starting data initialization check");

        let outcome = match tokio::time::timeout(self.timeout, self.run()).await {
            Ok(outcome) => outcome,
            Err(_) => RecoveryOutcome::failed(format!(
                "Initialization failed: timed out after {}s",
                self.timeout.as_secs()
            )),
        };

        self.initializing.store(false, Ordering::SeqCst);
        tracing::info!(success = outcome.success, message = %outcome.message, "Data initialization completed");
        outcome
    }

    fn reset(&self) {
        self.initializing.store(false, Ordering::SeqCst);
        self.attempted.store(false, Ordering::SeqCst);
    }
}

fn or_empty<T>(result: ClientResult<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not list {}", what);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.into(),
            slug: String::new(),
            image: String::new(),
            creation_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_missing_categories_compares_names_case_insensitively() {
        let backup = fallback_categories();
        let current = vec![
            category(10, "clothes"),
            category(11, "ELECTRONICS"),
            category(12, "Furniture"),
        ];
        let missing = find_missing_categories(&backup, &current);
        assert_eq!(missing, vec!["Shoes".to_string(), "Miscellaneous".to_string()]);
    }

    #[test]
    fn test_nothing_missing_when_remote_is_superset() {
        let backup = fallback_categories();
        let mut current: Vec<Category> = backup
            .iter()
            .map(|b| category(b.id + 100, &b.name))
            .collect();
        current.push(category(999, "Toys"));
        assert!(find_missing_categories(&backup, &current).is_empty());
    }

    #[test]
    fn test_missing_products_with_empty_remote() {
        let backup = fallback_products();
        let missing = find_missing_products(&backup, &[]);
        assert_eq!(missing.len(), backup.len());
    }
}
