//! A single Postgres session scoped to one run.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::config::DatabaseConfig;
use crate::error::{DatabaseError, DatabaseResult};
use crate::types::{CandidateRow, ColumnInfo, RecordId};

use super::ident::{is_integer_type, CatalogTable, TableName};
use super::CatalogStore;

/// One client plus the task driving its connection.
///
/// Call [`PgSession::close`] when done; dropping the session aborts the
/// connection task instead.
pub struct PgSession {
    client: Client,
    connection: Option<JoinHandle<()>>,
}

impl PgSession {
    /// Open a session using the configured host, credentials and timeout.
    pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.name)
            .user(&config.user)
            .application_name("tailor")
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(password) = config.resolved_password() {
            pg.password(password);
        }

        tracing::debug!(
            "Connecting to postgres at {}:{}/{}",
            config.host,
            config.port,
            config.name
        );
        let (client, connection) =
            pg.connect(NoTls)
                .await
                .map_err(|source| DatabaseError::Connect {
                    host: config.host.clone(),
                    port: config.port,
                    database: config.name.clone(),
                    source,
                })?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        Ok(Self {
            client,
            connection: Some(handle),
        })
    }

    /// Close the session and wait for the connection task to finish.
    pub async fn close(mut self) {
        let handle = self.connection.take();
        // Dropping the client ends the connection future.
        drop(self);
        if let Some(handle) = handle {
            if tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .is_err()
            {
                tracing::warn!("Postgres connection did not shut down within 5s");
            }
        }
        tracing::debug!("Postgres session closed");
    }

    /// `data_type` of one column, `None` when the column does not exist.
    async fn column_type(&self, table: &TableName, column: &str) -> DatabaseResult<Option<String>> {
        let row = self
            .client
            .query_opt(
                "SELECT data_type::text FROM information_schema.columns \
                 WHERE table_schema::text = coalesce($1, current_schema()) \
                 AND table_name::text = $2 AND column_name::text = $3",
                &[&table.schema(), &table.table(), &column],
            )
            .await
            .map_err(|e| DatabaseError::query("Failed to look up column type", e))?;
        row.map(|r| r.try_get::<_, String>(0))
            .transpose()
            .map_err(|e| DatabaseError::query("Failed to read column type", e))
    }

    async fn integer_ids(&self, catalog: &CatalogTable) -> DatabaseResult<bool> {
        let column = catalog.id_column.as_str();
        match self.column_type(&catalog.table, column).await? {
            Some(data_type) => Ok(is_integer_type(&data_type)),
            None => Err(DatabaseError::InvalidIdentifier {
                name: column.to_string(),
                reason: format!("no such column in table {}", catalog.table),
            }),
        }
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if let Some(handle) = self.connection.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl CatalogStore for PgSession {
    async fn server_version(&self) -> DatabaseResult<String> {
        let row = self
            .client
            .query_one("SELECT version()", &[])
            .await
            .map_err(|e| DatabaseError::query("Failed to query server version", e))?;
        row.try_get(0)
            .map_err(|e| DatabaseError::query("Failed to read server version", e))
    }

    async fn table_schema(&self, table: &TableName) -> DatabaseResult<Vec<ColumnInfo>> {
        let rows = self
            .client
            .query(
                "SELECT column_name::text, data_type::text, is_nullable::text \
                 FROM information_schema.columns \
                 WHERE table_schema::text = coalesce($1, current_schema()) \
                 AND table_name::text = $2 \
                 ORDER BY ordinal_position",
                &[&table.schema(), &table.table()],
            )
            .await
            .map_err(|e| DatabaseError::query(format!("Failed to read schema of {table}"), e))?;

        rows.iter()
            .map(|row| -> Result<ColumnInfo, tokio_postgres::Error> {
                let nullable: String = row.try_get(2)?;
                Ok(ColumnInfo {
                    name: row.try_get(0)?,
                    data_type: row.try_get(1)?,
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::query(format!("Failed to read schema of {table}"), e))
    }

    async fn create_backup(&self, source: &TableName, backup: &TableName) -> DatabaseResult<()> {
        let sql = format!(
            "CREATE TABLE {} AS SELECT * FROM {}",
            backup.qualified(),
            source.qualified()
        );
        self.client
            .batch_execute(&sql)
            .await
            .map_err(|e| DatabaseError::query(format!("Failed to create backup table {backup}"), e))
    }

    async fn fetch_candidates(&self, catalog: &CatalogTable) -> DatabaseResult<Vec<CandidateRow>> {
        let integer_ids = self.integer_ids(catalog).await?;
        let sql = catalog.select_candidates_sql(integer_ids);
        tracing::debug!("Candidate query: {}", sql);

        let rows = self
            .client
            .query(sql.as_str(), &[])
            .await
            .map_err(|e| DatabaseError::query("Failed to fetch candidate rows", e))?;

        rows.iter()
            .map(|row| -> DatabaseResult<CandidateRow> {
                let id = if integer_ids {
                    row.try_get::<_, i64>(0).map(RecordId::Int)
                } else {
                    row.try_get::<_, String>(0).map(RecordId::Text)
                }
                .map_err(|e| DatabaseError::UnsupportedIdType {
                    column: catalog.id_column.to_string(),
                    message: e.to_string(),
                })?;
                let image_url = row
                    .try_get(1)
                    .map_err(|e| DatabaseError::query("Failed to read candidate rows", e))?;
                Ok(CandidateRow { id, image_url })
            })
            .collect()
    }

    async fn update_row(
        &self,
        catalog: &CatalogTable,
        id: &RecordId,
        title: &str,
        description: &str,
    ) -> DatabaseResult<u64> {
        let context = || format!("Failed to update record {id}");
        let affected = match id {
            RecordId::Int(value) => self
                .client
                .execute(catalog.update_sql(true).as_str(), &[&title, &description, value])
                .await
                .map_err(|e| DatabaseError::query(context(), e))?,
            RecordId::Text(value) => self
                .client
                .execute(catalog.update_sql(false).as_str(), &[&title, &description, value])
                .await
                .map_err(|e| DatabaseError::query(context(), e))?,
        };
        Ok(affected)
    }
}
