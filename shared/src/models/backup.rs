//! Backup dataset records
//!
//! Flat rows of the static `categories.json` / `products.json` dataset used to
//! repair the remote catalog. Field names follow the dataset files, not the API.

use serde::{Deserialize, Serialize};

/// Category row from `categories.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupCategory {
    pub id: i64,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
}

/// Product row from `products.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupProduct {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Comma-joined image URLs
    #[serde(default)]
    pub images: String,
    /// Backup id of the owning category, stored as a string
    pub category_id: String,
    #[serde(default)]
    pub slug: String,
}

/// Both halves of the backup dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    pub categories: Vec<BackupCategory>,
    pub products: Vec<BackupProduct>,
}
