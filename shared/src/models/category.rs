//! Category Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity
///
/// Identity is `id`; two categories with the same id are the same category
/// even if the remote copy was renamed in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub creation_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub image: String,
}

/// Update category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_api_json() {
        let json = r#"{
            "id": 1,
            "name": "Clothes",
            "slug": "clothes",
            "image": "https://i.imgur.com/QkIa5tT.jpeg",
            "creationAt": "2025-01-10T08:30:00.000Z",
            "updatedAt": "2025-01-10T08:30:00.000Z"
        }"#;

        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.id, 1);
        assert_eq!(category.slug, "clothes");
        assert!(category.creation_at.is_some());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = CategoryUpdate {
            name: Some("Shoes".into()),
            image: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Shoes" }));
    }
}
