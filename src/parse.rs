use crate::error::FileError;
use csv_async::{AsyncReaderBuilder, StringRecord};
use std::collections::HashSet;
use tokio::io::AsyncRead;

/// A CSV file read into memory with every cell still a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    /// Data rows in file order, each padded to `headers.len()`.
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }
}

/// Read a whole CSV stream. The first record is the header.
pub async fn read_csv<R>(reader: R, delimiter: u8) -> Result<ParsedTable, FileError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        // Short rows are padded below; long rows are rejected below.
        .flexible(true)
        .buffer_capacity(1 << 20) // 1 MiB
        .create_reader(reader);

    let header_record = rdr.headers().await?.clone();
    if header_record.is_empty() {
        return Err(FileError::EmptyFile);
    }
    let headers = normalize_headers(&header_record);
    let width = headers.len();

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).await? {
        if record.len() > width {
            return Err(FileError::RowTooLong {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                got: record.len(),
                expected: width,
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_owned).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(ParsedTable { headers, rows })
}

/// Strip a byte-order mark, name blank columns `Unnamed: {i}` and suffix
/// repeats with `.1`, `.2`, ... so every column name is unique.
pub fn normalize_headers(record: &StringRecord) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(record.len());
    let mut out = Vec::with_capacity(record.len());

    for (i, raw) in record.iter().enumerate() {
        let raw = if i == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        let base = if raw.is_empty() {
            format!("Unnamed: {i}")
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        let mut n = 0usize;
        while seen.contains(&name) {
            n += 1;
            name = format!("{base}.{n}");
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}
