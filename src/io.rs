use crate::codec::Utf8Transcoder;
use crate::error::LoadError;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

pub const CSV_SUFFIX: &str = ".csv";

/// A CSV file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name without the `.csv` suffix, used verbatim as the table name.
    pub table_name: String,
}

impl SourceFile {
    /// Returns `None` unless `file_name` ends in exactly `.csv`.
    pub fn from_name(dir: &Path, file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(CSV_SUFFIX)?;
        // A bare ".csv" is a dotfile with no extension to strip.
        let table_name = if stem.is_empty() { file_name } else { stem };
        Some(Self {
            path: dir.join(file_name),
            table_name: table_name.to_string(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotCsv,
    NotAFile,
    NonUtf8Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntryKind {
    Csv(SourceFile),
    Skipped(PathBuf, SkipReason),
}

/// Classify the top-level entries of `dir`, sorted by file name.
///
/// Listing errors are fatal for the whole run; nothing below `dir` is visited.
pub async fn list_sources(dir: &Path) -> Result<Vec<DirEntryKind>, LoadError> {
    let list_err = |source| LoadError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(list_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(list_err)? {
        entries.push(entry);
    }
    entries.sort_by_key(|e| e.file_name());

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            out.push(DirEntryKind::Skipped(path, SkipReason::NonUtf8Name));
            continue;
        };
        let Some(source) = SourceFile::from_name(dir, &name) else {
            out.push(DirEntryKind::Skipped(path, SkipReason::NotCsv));
            continue;
        };
        // Follows symlinks. When metadata cannot be read (a dangling link,
        // say) the file stays in the run and fails on open with a report entry.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if !meta.is_file() => {
                out.push(DirEntryKind::Skipped(path, SkipReason::NotAFile));
            }
            _ => out.push(DirEntryKind::Csv(source)),
        }
    }
    Ok(out)
}

/// Wrap a raw reader so the CSV parser always sees UTF-8.
pub fn utf8_reader<R>(
    raw: R,
    charset: &'static encoding_rs::Encoding,
) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    // 1 MiB buffer for fewer syscalls on large files
    let buf = BufReader::with_capacity(1 << 20, raw);
    if charset == encoding_rs::UTF_8 {
        Box::new(buf)
    } else {
        let framed = FramedRead::new(buf, Utf8Transcoder::new(charset));
        Box::new(StreamReader::new(framed))
    }
}

/// Open a source file for parsing.
pub async fn reader_from_path(
    path: &Path,
    charset: &'static encoding_rs::Encoding,
) -> std::io::Result<Box<dyn AsyncRead + Unpin + Send>> {
    let file = File::open(path).await?;
    Ok(utf8_reader(file, charset))
}
