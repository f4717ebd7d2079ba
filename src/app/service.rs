//! Application service layer.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::{
    Account, AppError, CreateAccountRequest, CreateTransactionRequest, DatabaseClient,
    DatabaseError, DepositNotification, HealthResponse, HealthStatus, Notifier, Transaction,
};

/// Application service containing business logic
pub struct AppService {
    db_client: Arc<dyn DatabaseClient>,
    notifier: Arc<dyn Notifier>,
}

impl AppService {
    #[must_use]
    pub fn new(db_client: Arc<dyn DatabaseClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db_client,
            notifier,
        }
    }

    /// List every account with its balance
    #[instrument(skip(self))]
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.db_client.list_accounts().await
    }

    /// Get one account, failing with `AccountNotFound` when no row matches
    #[instrument(skip(self))]
    pub async fn get_account(&self, account_id: i32) -> Result<Account, AppError> {
        self.db_client
            .get_account(account_id)
            .await?
            .ok_or(AppError::Database(DatabaseError::AccountNotFound(account_id)))
    }

    /// Validate and register a new account.
    /// Nothing is written unless every field passes.
    #[instrument(skip(self, request), fields(id_card = %request.id_card_number))]
    pub async fn create_account(&self, request: &CreateAccountRequest) -> Result<Account, AppError> {
        request.check_fields().map_err(|e| {
            warn!(error = %e, "Account validation failed");
            e
        })?;

        let account = self.db_client.create_account(request).await.map_err(|e| {
            if matches!(e, AppError::Database(DatabaseError::DuplicateAccount(_))) {
                warn!("Duplicate id card number");
            }
            e
        })?;

        info!(account_id = %account.account_id, "Account created");
        Ok(account)
    }

    /// List every deposit, newest first
    #[instrument(skip(self))]
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        self.db_client.list_transactions().await
    }

    /// Deposit history of one account; unknown accounts have an empty history
    #[instrument(skip(self))]
    pub async fn get_account_history(&self, account_id: i32) -> Result<Vec<Transaction>, AppError> {
        self.db_client.get_account_history(account_id).await
    }

    /// Validate and record a deposit, then notify the sender.
    ///
    /// Notification failure does not fail the request: the deposit is
    /// already committed, so it is logged and the transaction returned.
    #[instrument(skip(self, request), fields(dest = %request.deposit_dest))]
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<Transaction, AppError> {
        let new_transaction = request.into_new_transaction().map_err(|e| {
            warn!(error = %e, "Transaction validation failed");
            e
        })?;

        let transaction = self.db_client.create_transaction(&new_transaction).await?;
        info!(
            transaction_id = %transaction.transaction_id,
            amount = %transaction.amount,
            "Deposit recorded"
        );

        self.notify(&transaction).await;
        Ok(transaction)
    }

    async fn notify(&self, transaction: &Transaction) {
        let Some(notification) = DepositNotification::for_transaction(transaction) else {
            warn!(
                transaction_id = %transaction.transaction_id,
                "No recipient for deposit notification"
            );
            return;
        };

        if let Err(e) = self.notifier.send_deposit_notification(&notification).await {
            warn!(
                transaction_id = %transaction.transaction_id,
                error = %e,
                "Deposit notification failed"
            );
        }
    }

    /// Perform health check on all dependencies
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let db_health = match self.db_client.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(_) => HealthStatus::Unhealthy,
        };
        HealthResponse::new(db_health)
    }
}
