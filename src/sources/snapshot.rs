//! Loads workbooks from the JSON snapshots written next to them.
//!
//! `reports/q1.xlsx` is read from `reports/q1.xlsx.json`; a path that is
//! already a `.json` file is read as-is. Relative paths resolve against the
//! converter's root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use super::DocumentConverter;
use super::document::{ConvertOptions, StructuredDocument};
use crate::core::CoreError;

pub struct SnapshotConverter {
    root: PathBuf,
}

impl SnapshotConverter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn snapshot_path(&self, path: &Path) -> PathBuf {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let is_json = resolved
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            resolved
        } else {
            let mut name = resolved.into_os_string();
            name.push(".json");
            PathBuf::from(name)
        }
    }
}

#[async_trait]
impl DocumentConverter for SnapshotConverter {
    async fn load_document(
        &self,
        path: &Path,
        options: ConvertOptions,
    ) -> Result<StructuredDocument, CoreError> {
        let snapshot = self.snapshot_path(path);
        debug!("Loading snapshot {} for {}", snapshot.display(), path.display());

        let contents = tokio::fs::read_to_string(&snapshot)
            .await
            .map_err(|e| CoreError::load_failure(path, e.to_string()))?;
        let mut document: StructuredDocument = serde_json::from_str(&contents)
            .map_err(|e| CoreError::load_failure(path, format!("invalid snapshot: {e}")))?;

        options.apply(&mut document);
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_snapshot_path_appends_json() {
        let converter = SnapshotConverter::new("/work");
        assert_eq!(
            converter.snapshot_path(Path::new("reports/q1.xlsx")),
            PathBuf::from("/work/reports/q1.xlsx.json")
        );
        assert_eq!(
            converter.snapshot_path(Path::new("/abs/q1.JSON")),
            PathBuf::from("/abs/q1.JSON")
        );
    }

    #[tokio::test]
    async fn test_load_document_applies_options() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.xlsx.json"),
            r#"{"sheets":[{"name":"S","cells":{"A1":{"value":"x","formula":"B1"},"A2":{"value":null}}}]}"#,
        )
        .unwrap();
        let converter = SnapshotConverter::new(dir.path());

        let kept = converter
            .load_document(Path::new("a.xlsx"), ConvertOptions::for_comparison())
            .await
            .unwrap();
        assert_eq!(kept.cell_count(), 2);
        assert_eq!(kept.sheets[0].cells["A1"].formula.as_deref(), Some("B1"));

        let stripped = converter
            .load_document(
                Path::new("a.xlsx"),
                ConvertOptions {
                    preserve_formulas: false,
                    preserve_styles: true,
                    preserve_comments: true,
                    ignore_empty_cells: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(stripped.cell_count(), 1);
        assert!(stripped.sheets[0].cells["A1"].formula.is_none());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_load_failure_for_workbook_path() {
        let dir = tempfile::tempdir().unwrap();
        let converter = SnapshotConverter::new(dir.path());
        let err = converter
            .load_document(Path::new("b.xlsx"), ConvertOptions::for_comparison())
            .await
            .unwrap_err();
        match err {
            CoreError::LoadFailure { path, .. } => assert_eq!(path, PathBuf::from("b.xlsx")),
            other => panic!("expected LoadFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c.xlsx.json"), "not json").unwrap();
        let converter = SnapshotConverter::new(dir.path());
        let err = converter
            .load_document(Path::new("c.xlsx"), ConvertOptions::for_comparison())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid snapshot"));
    }
}
