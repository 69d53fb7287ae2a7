use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::PagesConfig;
use crate::types::PageId;

/// Maps a locale data page to its content page.
///
/// `blog/home.yaml` becomes `<content_dir>/blog/index.md` with the default
/// `home` → `index` alias.
#[derive(Debug, Clone)]
pub struct PageResolver {
    /// Root of the content pages
    content_dir: PathBuf,
    /// Extension of data pages; other files have no content page
    data_extension: String,
    content_extension: String,
    /// Data file stem → content file stem
    aliases: BTreeMap<String, String>,
}

impl PageResolver {
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>, pages: &PagesConfig) -> Self {
        Self {
            content_dir: content_dir.into(),
            data_extension: pages.data_extension.clone(),
            content_extension: pages.content_extension.clone(),
            aliases: pages.aliases.clone(),
        }
    }

    /// Content page path for `page`. `None` when the id is not a data page.
    #[must_use]
    pub fn resolve(&self, page: &PageId) -> Option<PathBuf> {
        let path = page.as_path();
        if path.extension()?.to_str()? != self.data_extension {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let stem = self.aliases.get(stem).map_or(stem, String::as_str);
        let file_name = format!("{stem}.{}", self.content_extension);
        Some(self.content_dir.join(path.with_file_name(file_name)))
    }
}
