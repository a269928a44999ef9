//! The `tailor check` and `tailor schema` commands.

use anyhow::Context;
use clap::Args;
use tailor_core::config::CatalogConfig;
use tailor_core::types::ColumnInfo;
use tailor_core::{CatalogStore, Config, PgSession, TableName};

use super::setup::{CatalogArgs, DatabaseArgs};

/// Arguments for the `check` command.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Also verify the target table and its configured columns
    #[arg(long)]
    pub schema: bool,
}

/// Arguments for the `schema` command.
#[derive(Args, Debug, Default)]
pub struct SchemaArgs {
    /// Table to describe (defaults to the configured catalogue table)
    pub table: Option<String>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Execute the check command.
pub async fn execute(args: CheckArgs, mut config: Config) -> anyhow::Result<()> {
    args.database.apply(&mut config.database);
    args.catalog.apply(&mut config.catalog);
    config.check()?;

    let session = connect(&config).await?;
    let result = inspect(&session, &config.catalog, args.schema).await;
    session.close().await;
    result
}

/// Execute the schema command.
pub async fn schema(args: SchemaArgs, mut config: Config) -> anyhow::Result<()> {
    args.database.apply(&mut config.database);
    let table = TableName::parse(args.table.as_deref().unwrap_or(&config.catalog.table))?;

    let session = connect(&config).await?;
    let result = session.table_schema(&table).await;
    session.close().await;

    let columns = result?;
    if columns.is_empty() {
        anyhow::bail!("Table {} not found or has no columns", table);
    }
    println!("Columns in {}:", table);
    print!("{}", format_columns(&columns));
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<PgSession> {
    let db = &config.database;
    PgSession::connect(db)
        .await
        .with_context(|| format!("Cannot connect to {}:{}/{}", db.host, db.port, db.name))
}

async fn inspect(
    session: &PgSession,
    catalog: &CatalogConfig,
    with_schema: bool,
) -> anyhow::Result<()> {
    let version = session.server_version().await?;
    println!("Database connection successful");
    println!("  {}", version);

    if !with_schema {
        return Ok(());
    }

    let table = TableName::parse(&catalog.table)?;
    let columns = session.table_schema(&table).await?;
    if columns.is_empty() {
        anyhow::bail!("Table {} not found or has no columns", table);
    }
    println!("\nColumns in {}:", table);
    print!("{}", format_columns(&columns));

    let missing = missing_columns(catalog, &columns);
    if !missing.is_empty() {
        anyhow::bail!(
            "Configured columns missing from {}: {}",
            table,
            missing.join(", ")
        );
    }
    println!("\nAll configured columns present");
    Ok(())
}

/// One line per column: name, type, nullability.
fn format_columns(columns: &[ColumnInfo]) -> String {
    let width = columns
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max(6);
    columns
        .iter()
        .map(|c| {
            let nullable = if c.nullable { "NULL" } else { "NOT NULL" };
            format!("  - {:width$}  {}  {}\n", c.name, c.data_type, nullable)
        })
        .collect()
}

/// Configured columns that the table lacks. Names compare exactly.
fn missing_columns<'a>(catalog: &'a CatalogConfig, columns: &[ColumnInfo]) -> Vec<&'a str> {
    [
        catalog.id_column.as_str(),
        catalog.image_column.as_str(),
        catalog.title_column.as_str(),
        catalog.description_column.as_str(),
    ]
    .into_iter()
    .filter(|wanted| !columns.iter().any(|c| c.name == *wanted))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str, nullable: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
        }
    }

    #[test]
    fn formats_one_line_per_column() {
        let text = format_columns(&[
            column("id", "integer", false),
            column("image_url", "text", true),
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("id") && lines[0].ends_with("NOT NULL"));
        assert!(lines[1].contains("image_url") && lines[1].contains("text"));
    }

    #[test]
    fn reports_missing_configured_columns() {
        let catalog = CatalogConfig::default();
        let columns = vec![
            column("id", "bigint", false),
            column("image_url", "text", true),
            column("garment_title", "text", true),
        ];
        assert_eq!(
            missing_columns(&catalog, &columns),
            vec!["garment_description"]
        );
    }

    #[test]
    fn column_match_is_case_sensitive() {
        let catalog = CatalogConfig::default();
        let columns = vec![
            column("ID", "bigint", false),
            column("image_url", "text", true),
            column("garment_title", "text", true),
            column("garment_description", "text", true),
        ];
        assert_eq!(missing_columns(&catalog, &columns), vec!["id"]);
    }
}
