//! Per-column type inference over string cells.
//!
//! Each column takes the narrowest type every non-null cell fits:
//! boolean, then 64-bit integer, then float, falling back to text.

use crate::parse::ParsedTable;
use std::fmt;
use tokio_postgres::types::{ToSql, Type};

/// Cell spellings read as SQL NULL in every column.
pub const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    Text,
}

impl ColumnType {
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
        }
    }

    pub fn pg_type(self) -> Type {
        match self {
            ColumnType::Boolean => Type::BOOL,
            ColumnType::Integer => Type::INT8,
            ColumnType::Float => Type::FLOAT8,
            ColumnType::Text => Type::TEXT,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Borrow as a driver parameter. NULL needs the column type so the
    /// binary encoder accepts it.
    pub fn as_sql(&self, ty: ColumnType) -> &(dyn ToSql + Sync) {
        match self {
            Value::Null => match ty {
                ColumnType::Boolean => &None::<bool>,
                ColumnType::Integer => &None::<i64>,
                ColumnType::Float => &None::<f64>,
                ColumnType::Text => &None::<&str>,
            },
            Value::Bool(b) => b,
            Value::Int(i) => i,
            Value::Float(f) => f,
            Value::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// A parsed table with one type per column and typed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl TypedTable {
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.ty).collect()
    }
}

pub fn is_null(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_int(cell: &str) -> Option<i64> {
    cell.trim().parse().ok()
}

fn parse_float(cell: &str) -> Option<f64> {
    cell.trim().parse().ok()
}

/// Narrowest type that fits every non-null cell; all-null columns are text.
pub fn infer_column<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let (mut bool_ok, mut int_ok, mut float_ok) = (true, true, true);
    let mut any = false;

    for cell in cells.into_iter().filter(|c| !is_null(c)) {
        any = true;
        bool_ok = bool_ok && parse_bool(cell).is_some();
        int_ok = int_ok && parse_int(cell).is_some();
        float_ok = float_ok && parse_float(cell).is_some();
        if !(bool_ok || int_ok || float_ok) {
            break;
        }
    }

    match (any, bool_ok, int_ok, float_ok) {
        (false, ..) => ColumnType::Text,
        (true, true, ..) => ColumnType::Boolean,
        (true, _, true, _) => ColumnType::Integer,
        (true, _, _, true) => ColumnType::Float,
        _ => ColumnType::Text,
    }
}

fn convert(cell: &str, ty: ColumnType) -> Value {
    if is_null(cell) {
        return Value::Null;
    }
    match ty {
        ColumnType::Boolean => parse_bool(cell).map_or(Value::Null, Value::Bool),
        ColumnType::Integer => parse_int(cell).map_or(Value::Null, Value::Int),
        ColumnType::Float => parse_float(cell).map_or(Value::Null, Value::Float),
        ColumnType::Text => Value::Text(cell.to_string()),
    }
}

/// Infer every column of `table` and convert its cells.
pub fn infer_table(table: ParsedTable) -> TypedTable {
    let columns: Vec<Column> = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column {
            name: name.clone(),
            ty: infer_column(table.column(idx)),
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&columns)
                .map(|(cell, col)| convert(cell, col.ty))
                .collect()
        })
        .collect();

    TypedTable { columns, rows }
}
