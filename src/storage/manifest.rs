//! Category manifest persisted next to each category's files
//!
//! The manifest carries the category identity explicitly so the detail phase does
//! not have to recover it from the directory name.

use crate::catalog::Category;
use crate::storage::writer::write_atomic;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// File name of the manifest inside a category directory
pub const MANIFEST_FILE: &str = "category.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryManifest {
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl CategoryManifest {
    pub fn new(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug(),
            created_at: Utc::now(),
        }
    }

    pub fn category(&self) -> Category {
        Category::new(self.id, self.name.clone())
    }
}

/// Reads the manifest of a category directory, if one exists
pub async fn read_manifest(dir: &Path) -> Result<Option<CategoryManifest>> {
    let path = dir.join(MANIFEST_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes the manifest unless the directory already has one
pub async fn ensure_manifest(
    dir: &Path,
    category: &Category,
    cancel: &CancellationToken,
) -> Result<()> {
    let path = dir.join(MANIFEST_FILE);
    if tokio::fs::try_exists(&path).await? {
        return Ok(());
    }
    let text = serde_json::to_string_pretty(&CategoryManifest::new(category))?;
    write_atomic(&path, text.as_bytes(), cancel).await
}
