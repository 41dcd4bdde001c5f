//! Storage module for the persisted crawl trees
//!
//! This module handles everything the crawlers write to or read from disk:
//! - Directory layout of the listing and detail trees
//! - Per-category manifests
//! - Atomic, cancellable file writes

mod layout;
mod manifest;
mod writer;

pub use layout::{category_dirs, CategoryDir};
pub use manifest::{read_manifest, CategoryManifest, MANIFEST_FILE};
pub use writer::{file_exists, write_atomic, write_pretty_json, PART_SUFFIX};
