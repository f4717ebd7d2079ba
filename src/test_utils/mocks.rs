//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::{
    Account, AppError, CreateAccountRequest, DatabaseClient, DatabaseError, DepositNotification,
    NewTransaction, NotificationError, Notifier, Transaction, TransactionSource,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "Mock error".to_string())
    }
}

#[derive(Debug, Clone)]
struct StoredAccount {
    account_id: i32,
    id_card_number: String,
    name: String,
    email: String,
}

#[derive(Default)]
struct MockStore {
    accounts: Vec<StoredAccount>,
    transactions: Vec<Transaction>,
}

impl MockStore {
    fn find_account(&self, account_id: i32) -> Option<&StoredAccount> {
        self.accounts.iter().find(|a| a.account_id == account_id)
    }

    fn with_balance(&self, account: &StoredAccount) -> Account {
        let balance = self
            .transactions
            .iter()
            .filter(|t| t.deposit_dest == account.account_id)
            .map(|t| t.amount)
            .sum();
        Account {
            account_id: account.account_id,
            id_card_number: account.id_card_number.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            balance,
        }
    }

    /// Re-resolve the sender join the way a read query would.
    fn enrich(&self, tx: &Transaction) -> Transaction {
        let sender = tx
            .source
            .internal_id()
            .and_then(|id| self.find_account(id));
        Transaction {
            source_name: sender.map(|s| s.name.clone()),
            source_email: sender.map(|s| s.email.clone()),
            ..tx.clone()
        }
    }

    fn newest_first(&self, filter: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        let mut items: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|&t| filter(t))
            .map(|t| self.enrich(t))
            .collect();
        items.sort_by(|a, b| {
            b.transaction_time
                .cmp(&a.transaction_time)
                .then(b.transaction_id.cmp(&a.transaction_id))
        });
        items
    }
}

/// In-memory database client enforcing the same unique and foreign-key
/// rules as the PostgreSQL schema
pub struct MockDatabaseClient {
    store: Mutex<MockStore>,
    config: MockConfig,
    is_healthy: AtomicBool,
}

impl MockDatabaseClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            store: Mutex::new(MockStore::default()),
            config,
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Get all stored accounts (for testing)
    pub fn get_all_accounts(&self) -> Vec<Account> {
        let store = self.store.lock().unwrap();
        store
            .accounts
            .iter()
            .map(|a| store.with_balance(a))
            .collect()
    }

    /// Get all stored transactions in insertion order (for testing)
    pub fn get_all_transactions(&self) -> Vec<Transaction> {
        self.store.lock().unwrap().transactions.clone()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Database(DatabaseError::Query(
                self.config.message(),
            )));
        }
        Ok(())
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    async fn get_account(&self, account_id: i32) -> Result<Option<Account>, AppError> {
        self.check_should_fail()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .find_account(account_id)
            .map(|a| store.with_balance(a)))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.check_should_fail()?;
        let store = self.store.lock().unwrap();
        let mut keyed: Vec<_> = store
            .accounts
            .iter()
            .map(|a| {
                let latest = store
                    .transactions
                    .iter()
                    .filter(|t| t.deposit_dest == a.account_id)
                    .map(|t| t.transaction_time)
                    .max();
                (latest, store.with_balance(a))
            })
            .collect();
        // latest deposit first, never-credited accounts last, then by id
        keyed.sort_by(|(la, a), (lb, b)| match (la, lb) {
            (Some(x), Some(y)) => y.cmp(x).then(a.account_id.cmp(&b.account_id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.account_id.cmp(&b.account_id),
        });
        Ok(keyed.into_iter().map(|(_, account)| account).collect())
    }

    async fn create_account(&self, data: &CreateAccountRequest) -> Result<Account, AppError> {
        self.check_should_fail()?;
        let mut store = self.store.lock().unwrap();
        if store
            .accounts
            .iter()
            .any(|a| a.id_card_number == data.id_card_number)
        {
            return Err(AppError::Database(DatabaseError::DuplicateAccount(
                "account_id_card_number_key".to_string(),
            )));
        }

        let account = StoredAccount {
            account_id: store.accounts.len() as i32 + 1,
            id_card_number: data.id_card_number.clone(),
            name: data.name.clone(),
            email: data.email.clone(),
        };
        store.accounts.push(account.clone());
        Ok(store.with_balance(&account))
    }

    async fn create_transaction(&self, data: &NewTransaction) -> Result<Transaction, AppError> {
        self.check_should_fail()?;
        let mut store = self.store.lock().unwrap();

        if store.find_account(data.deposit_dest).is_none() {
            return Err(AppError::Database(DatabaseError::InvalidAccountReference(
                "transaction_log_destination_fkey".to_string(),
            )));
        }
        if let TransactionSource::Internal(id) = data.source {
            if store.find_account(id).is_none() {
                return Err(AppError::Database(DatabaseError::InvalidAccountReference(
                    "transaction_log_source_internal_fkey".to_string(),
                )));
            }
        }

        let transaction = Transaction {
            transaction_id: store.transactions.len() as i64 + 1,
            deposit_dest: data.deposit_dest,
            source: data.source.clone(),
            source_email: None,
            source_name: None,
            amount: data.amount,
            transaction_time: Utc::now(),
        };
        store.transactions.push(transaction.clone());
        Ok(store.enrich(&transaction))
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        self.check_should_fail()?;
        let store = self.store.lock().unwrap();
        Ok(store.newest_first(|_| true))
    }

    async fn get_account_history(&self, account_id: i32) -> Result<Vec<Transaction>, AppError> {
        self.check_should_fail()?;
        let store = self.store.lock().unwrap();
        Ok(store.newest_first(|t| t.deposit_dest == account_id))
    }
}

/// Notifier that records what it was asked to send
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<DepositNotification>>>,
    config: MockConfig,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            config,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Notifications accepted so far
    pub fn sent(&self) -> Vec<DepositNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_deposit_notification(
        &self,
        notification: &DepositNotification,
    ) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Notification(NotificationError::Transport(
                self.config.message(),
            )));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
