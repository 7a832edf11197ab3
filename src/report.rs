use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { rows: u64 },
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: PathBuf,
    pub table_name: String,
    pub outcome: Outcome,
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success { rows } => {
                write!(f, "loaded {rows} rows into table: {}", self.table_name)
            }
            Outcome::Failure(msg) => write!(
                f,
                "failed to load {} into table {}: {msg}",
                self.file.display(),
                self.table_name
            ),
        }
    }
}

/// Per-file outcomes of one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: Vec<FileReport>,
}

impl LoadReport {
    pub fn push(&mut self, report: FileReport) {
        self.files.push(report);
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|r| r.outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn get(&self, table_name: &str) -> Option<&FileReport> {
        self.files.iter().find(|r| r.table_name == table_name)
    }

    pub fn total_rows(&self) -> u64 {
        self.files
            .iter()
            .map(|r| match r.outcome {
                Outcome::Success { rows } => rows,
                Outcome::Failure(_) => 0,
            })
            .sum()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files={} loaded={} failed={} rows={}",
            self.files.len(),
            self.succeeded().count(),
            self.failed().count(),
            self.total_rows()
        )
    }
}
