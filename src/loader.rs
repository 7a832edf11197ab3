use crate::config::{ConnectionConfig, LoadOptions};
use crate::error::{error_chain, FileError, LoadResult};
use crate::infer::infer_table;
use crate::io::{list_sources, reader_from_path, DirEntryKind, SourceFile};
use crate::parse::read_csv;
use crate::report::{FileReport, LoadReport, Outcome};
use crate::sink::{PgSink, TableRef, TableSink};
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads every CSV in a directory through one sink, one file at a time.
pub struct Loader<S> {
    sink: S,
    options: LoadOptions,
}

impl<S: TableSink + Send> Loader<S> {
    pub fn new(sink: S, options: LoadOptions) -> Self {
        Self { sink, options }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// List `dir` and load each CSV in it. Only listing errors are returned;
    /// per-file failures land in the report.
    pub async fn load_dir(&mut self, dir: &Path) -> LoadResult<LoadReport> {
        let entries = list_sources(dir).await?;
        Ok(self.load_entries(entries).await)
    }

    pub async fn load_entries(&mut self, entries: Vec<DirEntryKind>) -> LoadReport {
        let mut report = LoadReport::default();
        for entry in entries {
            match entry {
                DirEntryKind::Skipped(path, reason) => {
                    info!(path = %path.display(), ?reason, "skipping entry");
                }
                DirEntryKind::Csv(source) => {
                    report.push(self.load_source(&source).await);
                }
            }
        }
        report
    }

    /// Load one file and turn any failure into a report entry.
    pub async fn load_source(&mut self, source: &SourceFile) -> FileReport {
        info!(file = %source.file_name(), table = %source.table_name, "loading");
        let outcome = match self.load_file(source).await {
            Ok(rows) => {
                info!(table = %source.table_name, rows, "table replaced");
                Outcome::Success { rows }
            }
            Err(e) => {
                let msg = error_chain(&e);
                warn!(file = %source.file_name(), error = %msg, "load failed");
                Outcome::Failure(msg)
            }
        };
        FileReport {
            file: source.path.clone(),
            table_name: source.table_name.clone(),
            outcome,
        }
    }

    pub async fn load_file(&mut self, source: &SourceFile) -> Result<u64, FileError> {
        let reader = reader_from_path(&source.path, self.options.encoding).await?;
        let parsed = read_csv(reader, self.options.delimiter).await?;
        let table = infer_table(parsed);
        debug!(
            table = %source.table_name,
            columns = ?table.columns.iter().map(|c| format!("{} {}", c.name, c.ty)).collect::<Vec<_>>(),
            "inferred schema"
        );

        let target = TableRef::new(self.options.schema.as_deref(), &source.table_name);
        self.sink
            .replace_table(&target, &table)
            .await
            .map_err(|e| FileError::Write(Box::new(e)))
    }
}

/// List `dir`, connect once, then replace one table per CSV file.
///
/// The directory is listed before connecting; either failing aborts the run.
/// A table that already exists under a file's name is dropped first, so
/// repeated runs re-sync rather than append.
pub async fn run(
    dir: &Path,
    config: &ConnectionConfig,
    options: LoadOptions,
) -> LoadResult<LoadReport> {
    let entries = list_sources(dir).await?;
    info!(dir = %dir.display(), entries = entries.len(), "listed source directory");

    let sink = PgSink::connect(config).await?;
    info!(endpoint = %config.endpoint(), "connected");

    let mut loader = Loader::new(sink, options);
    Ok(loader.load_entries(entries).await)
}
