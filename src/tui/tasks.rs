//! Runs [`Task`]s on the tokio runtime and reports back over a channel.
//!
//! Tasks never touch screen state. The only shared handle they write to is
//! the `SharedViewState` a comparison carries for progress text.

use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use chrono::Local;
use log::{Level, debug, info, warn};
use serde_json::json;

use crate::core::config;
use crate::core::logging::record_event;
use crate::core::{CoreError, SharedViewState};
use crate::sources::{
    CellDiffEngine, ConvertOptions, DiffEngine, DocumentConverter, DocumentDiff, FileLogSource,
    LogSource, SnapshotConverter, discover_documents, export_entries,
};
use crate::tui::screen::{Completion, Task};

/// The external collaborators the tasks run against.
#[derive(Clone)]
pub struct Collaborators {
    pub converter: Arc<dyn DocumentConverter>,
    pub engine: Arc<dyn DiffEngine>,
    pub logs: Arc<dyn LogSource>,
    /// Where log exports are written.
    pub export_dir: PathBuf,
}

impl Collaborators {
    /// Snapshot converter rooted at `root`, cell diff engine, and the log
    /// file. Exports go next to the log file.
    pub fn standard(root: PathBuf, log_path: PathBuf) -> Self {
        let export_dir = match log_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => root.clone(),
        };
        Self {
            converter: Arc::new(SnapshotConverter::new(root)),
            engine: Arc::new(CellDiffEngine),
            logs: Arc::new(FileLogSource::new(log_path)),
            export_dir,
        }
    }
}

pub fn spawn_task(task: Task, collaborators: &Collaborators, tx: mpsc::Sender<Completion>) {
    info!("Spawning task: {}", describe(&task));
    let collaborators = collaborators.clone();
    tokio::spawn(async move {
        let completion = run_task(task, &collaborators).await;
        if tx.send(completion).is_err() {
            warn!("Failed to send task completion: receiver dropped");
        }
    });
}

fn describe(task: &Task) -> String {
    match task {
        Task::DiscoverDocuments { root, .. } => format!("discover documents in {}", root.display()),
        Task::CompareDocuments { first, second, .. } => {
            format!("compare {} with {}", first.display(), second.display())
        }
        Task::LoadLogs => "load logs".to_string(),
        Task::ExportLogs { entries, .. } => format!("export {} log entries", entries.len()),
        Task::SaveSettings { path, .. } => format!("save settings to {}", path.display()),
    }
}

pub async fn run_task(task: Task, collaborators: &Collaborators) -> Completion {
    match task {
        Task::DiscoverDocuments { root, extensions } => {
            let result = tokio::task::spawn_blocking(move || discover_documents(&root, &extensions))
                .await
                .unwrap_or_else(|e| Err(CoreError::Internal(format!("discovery task failed: {e}"))));
            Completion::DocumentsDiscovered(result)
        }
        Task::CompareDocuments {
            first,
            second,
            progress,
        } => {
            let result = compare(&first, &second, &progress, collaborators).await;
            log_comparison(&first, &second, &result);
            Completion::ComparisonReady {
                first,
                second,
                result,
            }
        }
        Task::LoadLogs => Completion::LogsLoaded(collaborators.logs.load_entries().await),
        Task::ExportLogs {
            entries,
            filter,
            search,
        } => {
            let dir = collaborators.export_dir.clone();
            let count = entries.len();
            let result = tokio::task::spawn_blocking(move || {
                export_entries(&dir, &entries, &filter, &search, Local::now())
            })
            .await
            .unwrap_or_else(|e| Err(CoreError::Internal(format!("export task failed: {e}"))));
            if let Ok(path) = &result {
                record_event!(
                    Level::Info,
                    "logs_exported",
                    json!({ "file": path.display().to_string(), "entries": count }),
                );
            }
            Completion::LogsExported(result)
        }
        Task::SaveSettings { path, settings } => {
            let result = tokio::task::spawn_blocking(move || {
                config::save_settings(&path, &settings)
                    .map(|()| path)
                    .map_err(|e| CoreError::Internal(e.to_string()))
            })
            .await
            .unwrap_or_else(|e| Err(CoreError::Internal(format!("save task failed: {e}"))));
            Completion::SettingsSaved(result)
        }
    }
}

async fn compare(
    first: &std::path::Path,
    second: &std::path::Path,
    progress: &SharedViewState,
    collaborators: &Collaborators,
) -> Result<DocumentDiff, CoreError> {
    let options = ConvertOptions::for_comparison();

    progress.set_status(format!("Loading {}...", first.display()));
    let old = collaborators.converter.load_document(first, options).await?;

    progress.set_status(format!("Loading {}...", second.display()));
    let new = collaborators.converter.load_document(second, options).await?;

    progress.set_status("Computing differences...");
    debug!(
        "Comparing {} cells against {} cells",
        old.cell_count(),
        new.cell_count()
    );
    Ok(collaborators.engine.compute(&old, &new))
}

fn log_comparison(
    first: &std::path::Path,
    second: &std::path::Path,
    result: &Result<DocumentDiff, CoreError>,
) {
    match result {
        Ok(diff) => record_event!(
            Level::Info,
            "diff_comparison",
            json!({
                "file1": first.display().to_string(),
                "file2": second.display().to_string(),
                "has_changes": diff.has_changes(),
                "total_changes": diff.summary.total_changes,
                "cell_changes": diff.summary.cell_changes,
            }),
        ),
        Err(e) => record_event!(
            Level::Error,
            "diff_comparison failed",
            json!({
                "file1": first.display().to_string(),
                "file2": second.display().to_string(),
                "error": e.to_string(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_entry::LogLevel;
    use crate::test_support::{
        StubConverter, StubLogSource, log_entry, sample_document, stub_collaborators,
    };
    use std::time::Duration;

    #[tokio::test]
    async fn test_compare_reports_progress_and_diff() {
        let mut changed = sample_document();
        changed.sheets[0]
            .cells
            .insert("B9".to_string(), crate::sources::Cell::with_value("new"));
        let collaborators = stub_collaborators(
            StubConverter::new()
                .with("a.xlsx", sample_document())
                .with("b.xlsx", changed),
            StubLogSource::empty(),
        );
        let progress = SharedViewState::new();

        let completion = run_task(
            Task::CompareDocuments {
                first: PathBuf::from("a.xlsx"),
                second: PathBuf::from("b.xlsx"),
                progress: progress.clone(),
            },
            &collaborators,
        )
        .await;

        match completion {
            Completion::ComparisonReady { first, second, result } => {
                assert_eq!(first, PathBuf::from("a.xlsx"));
                assert_eq!(second, PathBuf::from("b.xlsx"));
                assert_eq!(result.unwrap().summary.cell_changes, 1);
            }
            other => panic!("unexpected completion {other:?}"),
        }
        assert_eq!(progress.status(), "Computing differences...");
    }

    #[tokio::test]
    async fn test_compare_surfaces_load_failure() {
        let collaborators = stub_collaborators(
            StubConverter::new().with("a.xlsx", sample_document()),
            StubLogSource::empty(),
        );
        let completion = run_task(
            Task::CompareDocuments {
                first: PathBuf::from("a.xlsx"),
                second: PathBuf::from("missing.xlsx"),
                progress: SharedViewState::new(),
            },
            &collaborators,
        )
        .await;
        match completion {
            Completion::ComparisonReady { result: Err(CoreError::LoadFailure { path, .. }), .. } => {
                assert_eq!(path, PathBuf::from("missing.xlsx"));
            }
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_discover_runs_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.xlsx"), b"").unwrap();
        let collaborators = stub_collaborators(StubConverter::new(), StubLogSource::empty());

        let completion = run_task(
            Task::DiscoverDocuments {
                root: dir.path().to_path_buf(),
                extensions: vec![".xlsx".to_string()],
            },
            &collaborators,
        )
        .await;
        match completion {
            Completion::DocumentsDiscovered(Ok(docs)) => assert_eq!(docs, vec![PathBuf::from("a.xlsx")]),
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_settings_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(config::CONFIG_FILE_NAME);
        let collaborators = stub_collaborators(StubConverter::new(), StubLogSource::empty());

        let completion = run_task(
            Task::SaveSettings {
                path: path.clone(),
                settings: Box::default(),
            },
            &collaborators,
        )
        .await;
        assert!(matches!(completion, Completion::SettingsSaved(Ok(ref p)) if *p == path));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_logs_returns_source_entries() {
        let entries = vec![
            log_entry(LogLevel::Error, "conversion failed", 60),
            log_entry(LogLevel::Info, "started", 0),
        ];
        let collaborators =
            stub_collaborators(StubConverter::new(), StubLogSource::with(entries.clone()));

        let completion = run_task(Task::LoadLogs, &collaborators).await;
        assert!(matches!(completion, Completion::LogsLoaded(Ok(ref loaded)) if *loaded == entries));
    }

    #[tokio::test]
    async fn test_export_logs_writes_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let collaborators = Collaborators {
            export_dir: dir.path().to_path_buf(),
            ..stub_collaborators(StubConverter::new(), StubLogSource::empty())
        };

        let completion = run_task(
            Task::ExportLogs {
                entries: vec![log_entry(LogLevel::Warn, "disk almost full", 0)],
                filter: "warn".to_string(),
                search: String::new(),
            },
            &collaborators,
        )
        .await;
        match completion {
            Completion::LogsExported(Ok(path)) => {
                assert_eq!(path.parent(), Some(dir.path()));
                let text = std::fs::read_to_string(path).unwrap();
                assert!(text.contains("Total Entries: 1\nFilter: warn\n"));
                assert!(text.contains("Message: disk almost full"));
            }
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[test]
    fn test_standard_exports_next_to_log_file() {
        let collaborators =
            Collaborators::standard(PathBuf::from("work"), PathBuf::from("/var/log/cv/cellview.log"));
        assert_eq!(collaborators.export_dir, PathBuf::from("/var/log/cv"));

        let bare = Collaborators::standard(PathBuf::from("work"), PathBuf::from("cellview.log"));
        assert_eq!(bare.export_dir, PathBuf::from("work"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawn_task_sends_completion() {
        let collaborators = stub_collaborators(StubConverter::new(), StubLogSource::empty());
        let (tx, rx) = mpsc::channel();

        spawn_task(Task::LoadLogs, &collaborators, tx);

        let completion = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(completion, Completion::LogsLoaded(Ok(ref entries)) if entries.is_empty()));
    }
}
