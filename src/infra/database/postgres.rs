//! PostgreSQL database client implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::domain::{
    Account, AppError, CreateAccountRequest, DatabaseClient, DatabaseError, NewTransaction,
    Transaction, TransactionSource,
};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

const ACCOUNT_WITH_BALANCE: &str = r#"
    SELECT acc.account_id, acc.id_card_number, acc.name, acc.email,
           COALESCE(SUM(tl.amount), 0)::DOUBLE PRECISION AS balance
    FROM account acc
    LEFT JOIN transaction_log tl ON tl.destination = acc.account_id
"#;

const TRANSACTION_WITH_SENDER: &str = r#"
    SELECT tl.transaction_id, tl.destination, tl.source_internal, tl.source_external,
           tl.amount, tl.transaction_time,
           src.name AS source_name, src.email AS source_email
    FROM transaction_log tl
    LEFT JOIN account src ON src.account_id = tl.source_internal
"#;

/// PostgreSQL database client with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, AppError> {
        Ok(Account {
            account_id: row.try_get("account_id")?,
            id_card_number: row.try_get("id_card_number")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            balance: row.try_get("balance")?,
        })
    }

    fn row_to_transaction(row: &sqlx::postgres::PgRow) -> Result<Transaction, AppError> {
        let internal: Option<i32> = row.try_get("source_internal")?;
        let external: Option<String> = row.try_get("source_external")?;
        let source = match internal {
            Some(id) => TransactionSource::Internal(id),
            None => TransactionSource::External(external.unwrap_or_default()),
        };

        Ok(Transaction {
            transaction_id: row.try_get("transaction_id")?,
            deposit_dest: row.try_get("destination")?,
            source,
            source_email: row.try_get("source_email")?,
            source_name: row.try_get("source_name")?,
            amount: row.try_get("amount")?,
            transaction_time: row.try_get("transaction_time")?,
        })
    }

    /// Best-effort lookup of an internal sender's name and email.
    async fn lookup_sender(&self, account_id: i32) -> Option<(String, String)> {
        let result = sqlx::query_as::<_, (String, String)>(
            "SELECT name, email FROM account WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(sender) => sender,
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Sender lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_account(&self, account_id: i32) -> Result<Option<Account>, AppError> {
        let query = format!(
            "{ACCOUNT_WITH_BALANCE} WHERE acc.account_id = $1 GROUP BY acc.account_id"
        );
        let row = sqlx::query(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let query = format!(
            "{ACCOUNT_WITH_BALANCE} GROUP BY acc.account_id \
             ORDER BY MAX(tl.transaction_time) DESC NULLS LAST, acc.account_id ASC"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_account).collect()
    }

    #[instrument(skip(self, data), fields(id_card = %data.id_card_number))]
    async fn create_account(&self, data: &CreateAccountRequest) -> Result<Account, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO account (id_card_number, name, email)
            VALUES ($1, $2, $3)
            RETURNING account_id
            "#,
        )
        .bind(&data.id_card_number)
        .bind(&data.name)
        .bind(&data.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(Account {
            account_id: row.try_get("account_id")?,
            id_card_number: data.id_card_number.clone(),
            name: data.name.clone(),
            email: data.email.clone(),
            balance: 0.0,
        })
    }

    #[instrument(skip(self, data), fields(dest = %data.deposit_dest, amount = %data.amount))]
    async fn create_transaction(&self, data: &NewTransaction) -> Result<Transaction, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO transaction_log (destination, source_internal, source_external, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING transaction_id, transaction_time
            "#,
        )
        .bind(data.deposit_dest)
        .bind(data.source.internal_id())
        .bind(data.source.external_email())
        .bind(data.amount)
        .fetch_one(&self.pool)
        .await?;

        let (source_name, source_email) = match data.source {
            TransactionSource::Internal(id) => match self.lookup_sender(id).await {
                Some((name, email)) => (Some(name), Some(email)),
                None => (None, None),
            },
            TransactionSource::External(_) => (None, None),
        };

        Ok(Transaction {
            transaction_id: row.try_get("transaction_id")?,
            deposit_dest: data.deposit_dest,
            source: data.source.clone(),
            source_email,
            source_name,
            amount: data.amount,
            transaction_time: row.try_get("transaction_time")?,
        })
    }

    #[instrument(skip(self))]
    async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        let query = format!(
            "{TRANSACTION_WITH_SENDER} ORDER BY tl.transaction_time DESC, tl.transaction_id DESC"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    #[instrument(skip(self))]
    async fn get_account_history(&self, account_id: i32) -> Result<Vec<Transaction>, AppError> {
        let query = format!(
            "{TRANSACTION_WITH_SENDER} WHERE tl.destination = $1 \
             ORDER BY tl.transaction_time DESC, tl.transaction_id DESC"
        );
        let rows = sqlx::query(&query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }
}
