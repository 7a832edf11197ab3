//! Bulk-load a directory of CSV files into PostgreSQL.
//!
//! - Every top-level `*.csv` file becomes a table named after the file.
//! - Existing tables of that name are dropped and recreated on every run.
//!   There is no confirmation and no history: a run is a destructive re-sync.
//! - Column types are inferred per column (boolean, bigint, double, text).
//!
//! Data shape:
//! - `ParsedTable { headers, rows }` with string cells
//! - `TypedTable { columns, rows }` with [`Value`] cells
//! - `LoadReport { files }` with one [`FileReport`] per CSV, in order
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
pub mod config;
mod error;
pub mod infer;
mod io;
mod loader;
mod parse;
mod report;
pub mod sink;

pub use crate::config::{ConnectionConfig, LoadOptions, DEFAULT_PORT};
pub use crate::error::{error_chain, BoxError, ConfigError, FileError, LoadError, LoadResult};
pub use crate::infer::{infer_table, Column, ColumnType, TypedTable, Value};
pub use crate::io::{
    list_sources, reader_from_path, utf8_reader, DirEntryKind, SkipReason, SourceFile,
};
pub use crate::loader::{run, Loader};
pub use crate::parse::{read_csv, ParsedTable};
pub use crate::report::{FileReport, LoadReport, Outcome};
pub use crate::sink::{PgSink, TableRef, TableSink};
