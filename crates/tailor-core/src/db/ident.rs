//! Validated, quoted SQL identifiers.
//!
//! Table and column names come from configuration and are spliced into SQL
//! text, so they are checked and always emitted double-quoted. Quoting makes
//! them case-sensitive.

use std::fmt;

use crate::config::CatalogConfig;
use crate::error::{DatabaseError, DatabaseResult};

/// Longest identifier Postgres keeps without truncation.
const MAX_IDENT_BYTES: usize = 63;

/// A single checked identifier (table or column name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> DatabaseResult<Self> {
        let name = name.into();
        let reason = if name.trim().is_empty() {
            Some("must not be empty")
        } else if name.len() > MAX_IDENT_BYTES {
            Some("longer than 63 bytes")
        } else if name.contains('\0') {
            Some("contains a NUL byte")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(DatabaseError::InvalidIdentifier {
                name,
                reason: reason.to_string(),
            }),
            None => Ok(Self(name)),
        }
    }

    /// The raw, unquoted name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a quoted SQL identifier.
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A table, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<Ident>,
    table: Ident,
}

impl TableName {
    /// Parse `table` or `schema.table`.
    pub fn parse(name: &str) -> DatabaseResult<Self> {
        match name.split_once('.') {
            Some((schema, table)) => Ok(Self {
                schema: Some(Ident::new(schema)?),
                table: Ident::new(table)?,
            }),
            None => Ok(Self {
                schema: None,
                table: Ident::new(name)?,
            }),
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_ref().map(Ident::as_str)
    }

    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Quoted reference for use in SQL text.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema.quoted(), self.table.quoted()),
            None => self.table.quoted(),
        }
    }

    /// A sibling table in the same schema.
    pub fn sibling(&self, table: impl Into<String>) -> DatabaseResult<Self> {
        Ok(Self {
            schema: self.schema.clone(),
            table: Ident::new(table)?,
        })
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// The table and columns a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct CatalogTable {
    pub table: TableName,
    pub id_column: Ident,
    pub image_column: Ident,
    pub title_column: Ident,
    pub description_column: Ident,
    /// Extra SQL predicate; trusted input, spliced in verbatim.
    pub filter: Option<String>,
    pub max_rows: Option<usize>,
}

impl CatalogTable {
    pub fn from_config(config: &CatalogConfig) -> DatabaseResult<Self> {
        Ok(Self {
            table: TableName::parse(&config.table)?,
            id_column: Ident::new(&config.id_column)?,
            image_column: Ident::new(&config.image_column)?,
            title_column: Ident::new(&config.title_column)?,
            description_column: Ident::new(&config.description_column)?,
            filter: config
                .filter
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            max_rows: config.max_rows,
        })
    }

    /// Candidate query. The id is cast to `bigint` or `text` per `integer_ids`.
    pub fn select_candidates_sql(&self, integer_ids: bool) -> String {
        let id = self.id_column.quoted();
        let image = self.image_column.quoted();
        let id_cast = if integer_ids { "bigint" } else { "text" };

        let mut sql = format!(
            "SELECT {id}::{id_cast}, {image}::text FROM {table} \
             WHERE {image} IS NOT NULL AND {image}::text <> ''",
            table = self.table.qualified(),
        );
        if let Some(filter) = &self.filter {
            sql.push_str(&format!(" AND ({filter})"));
        }
        sql.push_str(&format!(" ORDER BY {id}"));
        if let Some(max) = self.max_rows {
            sql.push_str(&format!(" LIMIT {max}"));
        }
        sql
    }

    /// Write-back statement: `$1` title, `$2` description, `$3` id.
    pub fn update_sql(&self, integer_ids: bool) -> String {
        let id = self.id_column.quoted();
        let predicate = if integer_ids {
            format!("{id} = $3::bigint")
        } else {
            format!("{id}::text = $3")
        };
        format!(
            "UPDATE {} SET {} = $1, {} = $2 WHERE {predicate}",
            self.table.qualified(),
            self.title_column.quoted(),
            self.description_column.quoted(),
        )
    }
}

/// Quotes Postgres identifiers, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    let escaped = input.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Whether an `information_schema` data type holds integers.
pub fn is_integer_type(data_type: &str) -> bool {
    matches!(
        data_type.to_ascii_lowercase().as_str(),
        "smallint" | "integer" | "bigint" | "int2" | "int4" | "int8"
    )
}
