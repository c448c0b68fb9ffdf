//! # Migration Export
//!
//! Turns inferred schemas and table contents into a PostgreSQL migration.
//!
//! ## Bundle Contents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MigrationBundle                                                        │
//! │                                                                         │
//! │  schema_sql         CREATE TABLE IF NOT EXISTS per table               │
//! │  data_sql           INSERT per record, one transaction                 │
//! │  connection_config  [database] section for the server-side pool        │
//! │  env_template       .env lines with placeholders                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Mapping
//! | ColumnType  | PostgreSQL              |
//! |-------------|-------------------------|
//! | PrimaryKey  | `VARCHAR(255) PRIMARY KEY` |
//! | Timestamp   | `TIMESTAMPTZ NOT NULL`  |
//! | Integer     | `BIGINT`                |
//! | Decimal     | `NUMERIC`               |
//! | Boolean     | `BOOLEAN`               |
//! | Text        | `TEXT`                  |
//! | Json        | `JSONB`                 |

use std::fmt::Write as _;

use mobilia_core::{ColumnType, Record, Schema, Value};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Everything needed to move the store into PostgreSQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationBundle {
    pub schema_sql: String,
    pub data_sql: String,
    pub connection_config: String,
    pub env_template: String,
}

/// Connection settings written into `connection_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConnectionConfig {
    database: DatabaseSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseSection {
    url: String,
    schema: String,
    max_connections: u32,
    min_connections: u32,
    connect_timeout_secs: u64,
}

/// Accumulates tables into a [`MigrationBundle`].
#[derive(Debug)]
pub struct MigrationExporter {
    namespace: String,
    schema_sql: String,
    data_sql: String,
    rows: usize,
}

impl MigrationExporter {
    pub fn new(namespace: &str) -> Self {
        MigrationExporter {
            namespace: namespace.to_string(),
            schema_sql: String::new(),
            data_sql: String::new(),
            rows: 0,
        }
    }

    /// Adds one table's DDL and rows.
    pub fn add_table(&mut self, table: &str, schema: &Schema, records: &[Record]) -> StoreResult<()> {
        let columns = ordered_columns(schema);

        self.schema_sql.push_str(&create_table_sql(table, &columns));

        if records.is_empty() {
            return Ok(());
        }

        let column_list = columns
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");

        for record in records {
            let values = columns
                .iter()
                .map(|(name, column)| sql_literal(&record.value(name), *column))
                .collect::<StoreResult<Vec<_>>>()?;

            // Writing to a String cannot fail
            let _ = writeln!(
                self.data_sql,
                "INSERT INTO {} ({}) VALUES ({});",
                quote_ident(table),
                column_list,
                values.join(", ")
            );
            self.rows += 1;
        }
        Ok(())
    }

    pub fn finish(self) -> StoreResult<MigrationBundle> {
        let data_sql = if self.rows == 0 {
            String::new()
        } else {
            format!("BEGIN;\n{}COMMIT;\n", self.data_sql)
        };

        let connection = ConnectionConfig {
            database: DatabaseSection {
                url: "postgres://${DB_USER}:${DB_PASSWORD}@${DB_HOST}:${DB_PORT}/${DB_NAME}"
                    .to_string(),
                schema: "public".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_secs: 30,
            },
        };

        let env_template = format!(
            "# PostgreSQL target for the {} store\n\
             DB_HOST=localhost\n\
             DB_PORT=5432\n\
             DB_NAME={}\n\
             DB_USER=postgres\n\
             DB_PASSWORD=\n",
            self.namespace, self.namespace
        );

        Ok(MigrationBundle {
            schema_sql: self.schema_sql,
            data_sql,
            connection_config: toml::to_string_pretty(&connection)?,
            env_template,
        })
    }
}

/// Header columns first, then the rest by name.
fn ordered_columns(schema: &Schema) -> Vec<(&str, ColumnType)> {
    let header = ["id", "created_at", "updated_at"];
    let mut columns: Vec<(&str, ColumnType)> = header
        .iter()
        .filter_map(|name| schema.get_key_value(*name))
        .map(|(name, column)| (name.as_str(), *column))
        .collect();
    columns.extend(
        schema
            .iter()
            .filter(|(name, _)| !header.contains(&name.as_str()))
            .map(|(name, column)| (name.as_str(), *column)),
    );
    columns
}

fn create_table_sql(table: &str, columns: &[(&str, ColumnType)]) -> String {
    let body = columns
        .iter()
        .map(|(name, column)| format!("    {} {}", quote_ident(name), postgres_type(*column)))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n\n",
        quote_ident(table),
        body
    )
}

pub fn postgres_type(column: ColumnType) -> &'static str {
    match column {
        ColumnType::PrimaryKey => "VARCHAR(255) PRIMARY KEY",
        ColumnType::Timestamp => "TIMESTAMPTZ NOT NULL",
        ColumnType::Integer => "BIGINT",
        ColumnType::Decimal => "NUMERIC",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Text => "TEXT",
        ColumnType::Json => "JSONB",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Renders a value for a column of the given type.
fn sql_literal(value: &Value, column: ColumnType) -> StoreResult<String> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }

    if column == ColumnType::Json {
        let json = serde_json::to_string(value)?;
        return Ok(format!("{}::jsonb", quote_literal(&json)));
    }

    Ok(match value {
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(_) => value.to_string(),
        Value::String(text) => quote_literal(text),
        other => quote_literal(&serde_json::to_string(other)?),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
