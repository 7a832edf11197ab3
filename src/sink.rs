//! Destinations for typed tables.

use crate::error::LoadError;
use crate::infer::TypedTable;
use crate::ConnectionConfig;
use async_trait::async_trait;
use std::fmt;
use tokio_postgres::binary_copy::BinaryCopyInWriter;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls};

/// Fully qualified destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        Self {
            schema: schema.map(str::to_owned),
            name: name.to_string(),
        }
    }

    /// SQL form with every part quoted.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Double-quote an identifier so it is used verbatim, case and all.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn create_table_sql(target: &TableRef, table: &TypedTable) -> String {
    let cols = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", target.qualified(), cols)
}

pub fn copy_in_sql(target: &TableRef, table: &TypedTable) -> String {
    let cols = table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN (FORMAT binary)",
        target.qualified(),
        cols
    )
}

/// Something that can replace a whole table with new contents.
#[async_trait]
pub trait TableSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Drop `target` if present, recreate it from `table`'s columns and write
    /// every row in order. Returns the number of rows written.
    async fn replace_table(&mut self, target: &TableRef, table: &TypedTable)
        -> Result<u64, Self::Error>;
}

/// Writes tables over one PostgreSQL connection.
///
/// Statements run outside any transaction: a failure after the drop leaves
/// the table missing or partially filled.
pub struct PgSink {
    client: Client,
}

impl PgSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Open the single connection used for the whole run.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, LoadError> {
        let endpoint = config.endpoint();
        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|source| LoadError::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, endpoint = %endpoint, "postgres connection closed");
            }
        });

        Ok(Self::new(client))
    }
}

#[async_trait]
impl TableSink for PgSink {
    type Error = tokio_postgres::Error;

    async fn replace_table(
        &mut self,
        target: &TableRef,
        table: &TypedTable,
    ) -> Result<u64, Self::Error> {
        let drop = format!("DROP TABLE IF EXISTS {}", target.qualified());
        tracing::debug!(sql = %drop, "replacing table");
        self.client.batch_execute(&drop).await?;

        let create = create_table_sql(target, table);
        tracing::debug!(sql = %create, "creating table");
        self.client.batch_execute(&create).await?;

        if table.columns.is_empty() {
            return Ok(0);
        }

        let col_types = table.column_types();
        let pg_types: Vec<Type> = col_types.iter().map(|ty| ty.pg_type()).collect();
        let sink = self.client.copy_in(copy_in_sql(target, table).as_str()).await?;
        let writer = BinaryCopyInWriter::new(sink, &pg_types);
        futures::pin_mut!(writer);

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(col_types.len());
        for row in &table.rows {
            params.clear();
            params.extend(row.iter().zip(&col_types).map(|(v, ty)| v.as_sql(*ty)));
            writer.as_mut().write(&params).await?;
        }

        writer.finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{Column, ColumnType};

    fn orders() -> TypedTable {
        TypedTable {
            columns: vec![
                Column {
                    name: "id".into(),
                    ty: ColumnType::Integer,
                },
                Column {
                    name: "Amount \"usd\"".into(),
                    ty: ColumnType::Float,
                },
            ],
            rows: vec![],
        }
    }

    #[test]
    fn identifiers_are_quoted_verbatim() {
        assert_eq!(quote_ident("Orders"), "\"Orders\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            TableRef::new(Some("staging"), "orders").qualified(),
            "\"staging\".\"orders\""
        );
    }

    #[test]
    fn ddl_keeps_column_order_and_types() {
        let target = TableRef::new(None, "orders");
        assert_eq!(
            create_table_sql(&target, &orders()),
            "CREATE TABLE \"orders\" (\"id\" BIGINT, \"Amount \"\"usd\"\"\" DOUBLE PRECISION)"
        );
        assert_eq!(
            copy_in_sql(&target, &orders()),
            "COPY \"orders\" (\"id\", \"Amount \"\"usd\"\"\") FROM STDIN (FORMAT binary)"
        );
    }
}
