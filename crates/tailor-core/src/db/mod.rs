//! Catalogue database access.
//!
//! The batch runner talks to the catalogue only through [`CatalogStore`];
//! [`PgSession`] is the Postgres implementation.

mod ident;
mod postgres;

pub use ident::{is_integer_type, quote_ident, CatalogTable, Ident, TableName};
pub use postgres::PgSession;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};

use crate::error::DatabaseResult;
use crate::types::{CandidateRow, ColumnInfo, RecordId};

/// Operations a run needs from the catalogue.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Server version string, used as a connection check.
    async fn server_version(&self) -> DatabaseResult<String>;

    /// Columns of `table` in ordinal order. Empty if the table does not exist.
    async fn table_schema(&self, table: &TableName) -> DatabaseResult<Vec<ColumnInfo>>;

    /// `CREATE TABLE backup AS SELECT * FROM source`.
    async fn create_backup(&self, source: &TableName, backup: &TableName) -> DatabaseResult<()>;

    /// Rows with a non-empty image reference, ordered by id.
    async fn fetch_candidates(&self, catalog: &CatalogTable) -> DatabaseResult<Vec<CandidateRow>>;

    /// Write title and description to one row. Returns the affected row count.
    async fn update_row(
        &self,
        catalog: &CatalogTable,
        id: &RecordId,
        title: &str,
        description: &str,
    ) -> DatabaseResult<u64>;
}

/// `<table>_backup_<YYYYmmdd_HHMMSS>` in the source table's schema.
pub fn backup_table_name<Tz: TimeZone>(
    source: &TableName,
    at: &DateTime<Tz>,
) -> DatabaseResult<TableName>
where
    Tz::Offset: std::fmt::Display,
{
    source.sibling(format!(
        "{}_backup_{}",
        source.table(),
        at.format("%Y%m%d_%H%M%S")
    ))
}


#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    #[test]
    fn test_backup_table_name_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
            .and_utc();
        let source = TableName::parse("shop.garments").unwrap();
        let backup = backup_table_name(&source, &at).unwrap();
        assert_eq!(backup.to_string(), "shop.garments_backup_20240309_140507");
    }

    #[test]
    fn test_backup_name_too_long_is_rejected() {
        let source = TableName::parse(&"t".repeat(60)).unwrap();
        assert!(backup_table_name(&source, &Utc::now()).is_err());
    }
}
