//! Finding candidate workbooks under a working root.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::{debug, warn};

use crate::core::CoreError;
use crate::core::config::DEFAULT_DOCUMENT_EXTENSIONS;

/// Walk `root` recursively and return every file whose extension matches one
/// of `extensions` (case-insensitive, leading dot optional), relative to
/// `root`, in lexical walk order.
///
/// Directories whose name starts with `.` are skipped, except `root` itself.
/// Gitignore rules are not applied. An empty `extensions` falls back to the
/// default workbook extensions.
pub fn discover_documents(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, CoreError> {
    if !root.is_dir() {
        return Err(CoreError::NotFound(format!(
            "working directory not found: {}",
            root.display()
        )));
    }

    let wanted: Vec<String> = if extensions.is_empty() {
        DEFAULT_DOCUMENT_EXTENSIONS.iter().map(|e| normalize_extension(e)).collect()
    } else {
        extensions.iter().map(|e| normalize_extension(e)).collect()
    };

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let hidden_dir = entry.depth() > 0
                && entry.file_type().is_some_and(|t| t.is_dir())
                && entry.file_name().to_string_lossy().starts_with('.');
            !hidden_dir
        })
        .build();

    let mut documents = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| wanted.contains(&ext));
        if !matches {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        documents.push(relative);
    }

    debug!("Discovered {} documents under {}", documents.len(), root.display());
    Ok(documents)
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}
