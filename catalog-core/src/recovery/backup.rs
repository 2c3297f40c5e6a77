//! Backup dataset loading

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use shared::{BackupCategory, BackupData, BackupProduct};

use super::RecoveryError;

/// Image used when a backup row carries none
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200/EFEFEF/666666?text=No+Image";

/// Directory holding `categories.json` and `products.json`
#[derive(Debug, Clone)]
pub struct BackupDataset {
    dir: PathBuf,
}

impl BackupDataset {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn read_categories(&self) -> Result<Vec<BackupCategory>, RecoveryError> {
        read_json(&self.dir.join("categories.json")).await
    }

    pub async fn read_products(&self) -> Result<Vec<BackupProduct>, RecoveryError> {
        read_json(&self.dir.join("products.json")).await
    }

    /// Load both files; a file that cannot be read is replaced by the built-in fallback
    pub async fn load(&self) -> BackupData {
        let (categories, products) = tokio::join!(self.read_categories(), self.read_products());

        let categories = categories.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load categories backup, using fallback");
            fallback_categories()
        });
        let products = products.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load products backup, using fallback");
            fallback_products()
        });

        tracing::debug!(
            categories = categories.len(),
            products = products.len(),
            "Backup data loaded"
        );

        BackupData { categories, products }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RecoveryError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RecoveryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| RecoveryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Split a comma-joined image list, falling back to the placeholder
pub fn parse_images(images: &str) -> Vec<String> {
    let parsed: Vec<String> = images
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if parsed.is_empty() {
        vec![PLACEHOLDER_IMAGE.to_string()]
    } else {
        parsed
    }
}

fn backup_category(id: i64, slug: &str, name: &str, image: &str) -> BackupCategory {
    BackupCategory {
        id,
        slug: slug.into(),
        name: name.into(),
        image: image.into(),
    }
}

pub fn fallback_categories() -> Vec<BackupCategory> {
    vec![
        backup_category(1, "clothes", "Clothes", "https://i.imgur.com/QkIa5tT.jpeg"),
        backup_category(2, "electronics", "Electronics", "https://i.imgur.com/ZANVnHE.jpeg"),
        backup_category(3, "furniture", "Furniture", "https://i.imgur.com/Qphac99.jpeg"),
        backup_category(4, "shoes", "Shoes", "https://i.imgur.com/qNOjJje.jpeg"),
        backup_category(5, "miscellaneous", "Miscellaneous", "https://i.imgur.com/BG8J0Fj.jpg"),
    ]
}

pub fn fallback_products() -> Vec<BackupProduct> {
    vec![
        BackupProduct {
            id: 1,
            title: "Majestic Mountain Graphic T-Shirt".into(),
            description: "Elevate your wardrobe with this stylish black t-shirt featuring a striking monochrome mountain range graphic.".into(),
            price: 44.0,
            images: "https://i.imgur.com/QkIa5tT.jpeg,https://i.imgur.com/jb5Yu0h.jpeg,https://i.imgur.com/UlxxXyG.jpeg".into(),
            category_id: "1".into(),
            slug: "majestic-mountain-graphic-t-shirt".into(),
        },
        BackupProduct {
            id: 2,
            title: "Classic Red Pullover Hoodie".into(),
            description: "Elevate your casual wardrobe with our Classic Red Pullover Hoodie.".into(),
            price: 10.0,
            images: "https://i.imgur.com/1twoaDy.jpeg,https://i.imgur.com/FDwQgLy.jpeg,https://i.imgur.com/kg1ZhhH.jpeg".into(),
            category_id: "1".into(),
            slug: "classic-red-pullover-hoodie".into(),
        },
    ]
}
