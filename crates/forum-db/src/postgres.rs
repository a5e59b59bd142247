//! PostgreSQL database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use forum_core::config::{PostgresConfig, SslMode};
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

/// PostgreSQL backend over a single `tokio-postgres` connection.
///
/// Concurrent calls share the connection; the driver pipelines them, so
/// statements reach the server one after another in submission order.
pub struct PostgresBackend {
    client: Client,
    connection: JoinHandle<()>,
}

/// Map the configured sslmode onto the driver's
pub(crate) fn ssl_mode(mode: SslMode) -> tokio_postgres::config::SslMode {
    match mode {
        SslMode::Disable => tokio_postgres::config::SslMode::Disable,
        SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
        SslMode::Require => tokio_postgres::config::SslMode::Require,
    }
}

/// Build driver connection parameters from config
pub(crate) fn driver_config(config: &PostgresConfig) -> tokio_postgres::Config {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .user(&config.user)
        .dbname(&config.dbname)
        .ssl_mode(ssl_mode(config.sslmode))
        .application_name("forum-vape");
    if !config.pass.is_empty() {
        pg.password(&config.pass);
    }
    pg
}

fn as_params<'a>(params: &'a [&'a str]) -> Vec<&'a (dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl PostgresBackend {
    /// Connect and spawn the connection driver task.
    ///
    /// No TLS connector is installed: `sslmode: require` fails here.
    pub async fn connect(config: &PostgresConfig) -> DbResult<Self> {
        let (client, connection) = driver_config(config)
            .connect(NoTls)
            .await
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", config.summary(), e)))?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("Postgres connection closed with error: {}", e);
            }
        });

        Ok(Self { client, connection })
    }
}

impl Drop for PostgresBackend {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

#[async_trait]
impl Database for PostgresBackend {
    async fn ping(&self) -> DbResult<()> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| DbError::ConnectionError(format!("ping failed: {}", DbError::from(e))))?;
        Ok(())
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<u64> {
        let params = as_params(params);
        Ok(self.client.execute(sql, &params).await?)
    }

    async fn query_strings(&self, sql: &str, params: &[&str]) -> DbResult<Vec<String>> {
        let params = as_params(params);
        let rows = self.client.query(sql, &params).await?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|e| DbError::DecodeError(e.to_string()))
            })
            .collect()
    }

    fn db_type(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
