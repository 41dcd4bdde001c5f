//! Category catalog
//!
//! Loads the fixed set of job categories that seed the listing crawl. The catalog is
//! a JSON array of `{ "name": ..., "id": ... }` objects read once per run.

mod category;

pub use category::Category;

use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::path::Path;

/// Loads the catalog file and returns its categories sorted by id
pub async fn load_categories(path: &Path) -> Result<Vec<Category>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        HarvestError::Catalog(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_categories(&content)
}

/// Parses catalog JSON, enforcing unique ids and names
pub fn parse_categories(content: &str) -> Result<Vec<Category>> {
    let mut categories: Vec<Category> = serde_json::from_str(content)
        .map_err(|e| HarvestError::Catalog(format!("Invalid catalog JSON: {}", e)))?;

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for category in &categories {
        if !ids.insert(category.id) {
            return Err(HarvestError::Catalog(format!(
                "Duplicate category id {}",
                category.id
            )));
        }
        if !names.insert(category.name.as_str()) {
            return Err(HarvestError::Catalog(format!(
                "Duplicate category name '{}'",
                category.name
            )));
        }
    }

    categories.sort_by_key(|c| c.id);
    Ok(categories)
}
