//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{
    Account, CreateAccountRequest, DepositNotification, NewTransaction, Transaction,
};

/// Database client trait for persistence operations
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Check database connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Get a single account with its computed balance
    async fn get_account(&self, account_id: i32) -> Result<Option<Account>, AppError>;

    /// List all accounts, most recently credited first
    async fn list_accounts(&self) -> Result<Vec<Account>, AppError>;

    /// Register a new account; the returned account carries the assigned id
    async fn create_account(&self, data: &CreateAccountRequest) -> Result<Account, AppError>;

    /// Record a deposit; the returned transaction carries the assigned id
    async fn create_transaction(&self, data: &NewTransaction) -> Result<Transaction, AppError>;

    /// All deposits, newest first
    async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError>;

    /// Deposits into one account, newest first
    async fn get_account_history(&self, account_id: i32) -> Result<Vec<Transaction>, AppError>;
}

/// Outbound channel for deposit notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_deposit_notification(
        &self,
        notification: &DepositNotification,
    ) -> Result<(), AppError>;
}
