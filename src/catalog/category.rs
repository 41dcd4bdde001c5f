/// Job category definitions and the name transformations derived from them
use serde::{Deserialize, Serialize};
use std::fmt;

/// A job category as listed in the static catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

impl Category {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the URL slug used in the category's search path
    ///
    /// Substitutions are applied in a fixed order so that `" & "` and `" - "` are
    /// consumed before single spaces, then the result is lower-cased.
    ///
    /// # Example
    ///
    /// ```
    /// use pracuj_harvest::catalog::Category;
    ///
    /// let category = Category::new(5016, "IT & Telekomunikacja");
    /// assert_eq!(category.slug(), "it%20telekomunikacja");
    /// ```
    pub fn slug(&self) -> String {
        self.name
            .replace(" & ", "%20")
            .replace(" - ", "%20-%20")
            .replace(' ', "%20")
            .to_lowercase()
    }

    /// Returns the search-results path for the given page
    pub fn search_path(&self, prefix: &str, page: u32) -> String {
        format!(
            "{}/{};cc,{}?pn={}",
            prefix.trim_end_matches('/'),
            self.slug(),
            self.id,
            page
        )
    }

    /// Returns the directory name `"<name> - <id>"` with path-hostile characters replaced
    pub fn dir_name(&self) -> String {
        let safe: String = self
            .name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("{} - {}", safe.trim(), self.id)
    }

    /// Recovers a category from a directory name produced by [`Category::dir_name`]
    ///
    /// Splits on the last `-`, so names that themselves contain dashes survive.
    pub fn from_dir_name(dir_name: &str) -> Option<Self> {
        let (name, id) = dir_name.rsplit_once('-')?;
        let id = id.trim().parse().ok()?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(id, name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
