//! Directory layout of the persisted listing and detail trees
//!
//! ```text
//! {listing-dir}/{name} - {id}/category.json
//! {listing-dir}/{name} - {id}/{id}-{page}.html
//! {listing-dir}/{name} - {id}/{id}-{page}.json
//! {details-dir}/{name} - {id}/category.json
//! {details-dir}/{name} - {id}/{offerId}-details.json
//! {details-dir}/{name} - {id}/{offerId}-listing.json
//! ```

use crate::catalog::Category;
use crate::storage::manifest::{ensure_manifest, read_manifest};
use crate::Result;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// One category's directory within a persisted tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDir {
    root: PathBuf,
}

impl CategoryDir {
    /// Directory for `category` under the tree rooted at `base`
    pub fn new(base: &Path, category: &Category) -> Self {
        Self {
            root: base.join(category.dir_name()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates the directory and its manifest
    pub async fn ensure(&self, category: &Category, cancel: &CancellationToken) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        ensure_manifest(&self.root, category, cancel).await
    }

    pub fn listing_html(&self, category_id: u32, page: u32) -> PathBuf {
        self.root.join(format!("{}-{}.html", category_id, page))
    }

    pub fn listing_json(&self, category_id: u32, page: u32) -> PathBuf {
        self.root.join(format!("{}-{}.json", category_id, page))
    }

    pub fn offer_details(&self, offer_id: u64) -> PathBuf {
        self.root.join(format!("{}-details.json", offer_id))
    }

    pub fn offer_listing(&self, offer_id: u64) -> PathBuf {
        self.root.join(format!("{}-listing.json", offer_id))
    }

    /// Lists persisted listing payloads for `category_id`, ordered by page number
    ///
    /// Only `{id}-{page}.json` files count; manifests and in-flight files are ignored.
    pub async fn listing_pages(&self, category_id: u32) -> Result<Vec<(u32, PathBuf)>> {
        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(page) = parse_listing_file_name(name, category_id) {
                pages.push((page, entry.path()));
            }
        }
        pages.sort_by_key(|(page, _)| *page);
        Ok(pages)
    }
}

/// Parses `{id}-{page}.json`, returning the page if the id matches
fn parse_listing_file_name(name: &str, category_id: u32) -> Option<u32> {
    let stem = name.strip_suffix(".json")?;
    let (id, page) = stem.rsplit_once('-')?;
    if id.parse::<u32>().ok()? != category_id {
        return None;
    }
    page.parse().ok()
}

/// Enumerates the category directories under `base`, ordered by category id
///
/// Identity comes from the manifest when present, otherwise from the directory name.
/// Directories that yield neither are logged and skipped.
pub async fn category_dirs(base: &Path) -> Result<Vec<(Category, CategoryDir)>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(base).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let path = entry.path();

        let category = match read_manifest(&path).await {
            Ok(Some(manifest)) => Some(manifest.category()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Unreadable manifest in {}: {}", path.display(), e);
                None
            }
        };
        let category = category.or_else(|| {
            entry
                .file_name()
                .to_str()
                .and_then(Category::from_dir_name)
        });

        match category {
            Some(category) => found.push((category, CategoryDir { root: path })),
            None => tracing::warn!(
                "Skipping {}: not a category directory",
                path.display()
            ),
        }
    }
    found.sort_by_key(|(category, _)| category.id);
    Ok(found)
}
