//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::ValidationError;
use super::validation::{is_valid_email, is_valid_id_card, is_valid_name};

/// Registered account with its computed balance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Account {
    /// Store-assigned account number
    #[serde(rename = "accountid")]
    #[schema(example = 1)]
    pub account_id: i32,
    /// National ID card number (16 digits)
    #[serde(rename = "idcardno")]
    #[schema(example = "1234567890123456")]
    pub id_card_number: String,
    /// Display name
    #[schema(example = "Michael")]
    pub name: String,
    /// Contact email address
    #[schema(example = "mike@x.com")]
    pub email: String,
    /// Sum of all deposits into this account
    #[schema(example = 3879000.0)]
    pub balance: f64,
}

/// Request to register a new account
///
/// Absent fields decode as empty strings so they fail their own check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateAccountRequest {
    #[serde(rename = "idcardno")]
    #[schema(example = "1234567890123456")]
    pub id_card_number: String,
    #[schema(example = "Michael")]
    pub name: String,
    #[schema(example = "mike@x.com")]
    pub email: String,
}

impl CreateAccountRequest {
    #[must_use]
    pub fn new(
        id_card_number: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id_card_number: id_card_number.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    /// Checks id card, name and email in that order, stopping at the first failure.
    pub fn check_fields(&self) -> Result<(), ValidationError> {
        if !is_valid_id_card(&self.id_card_number) {
            return Err(ValidationError::InvalidIdCard);
        }
        if !is_valid_name(&self.name) {
            return Err(ValidationError::InvalidName);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }
}

/// Origin of a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSource {
    /// Sent from another registered account
    Internal(i32),
    /// Sent by a non-member identified by email
    External(String),
}

impl TransactionSource {
    #[must_use]
    pub fn internal_id(&self) -> Option<i32> {
        match self {
            Self::Internal(id) => Some(*id),
            Self::External(_) => None,
        }
    }

    #[must_use]
    pub fn external_email(&self) -> Option<&str> {
        match self {
            Self::Internal(_) => None,
            Self::External(email) => Some(email),
        }
    }
}

/// Request to record a deposit
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTransactionRequest {
    /// Destination account number
    #[serde(rename = "depositdest")]
    #[schema(example = 1)]
    pub deposit_dest: i32,
    /// Deposit amount
    #[validate(range(min = 0.0, message = "Amount must not be negative"))]
    #[schema(example = 3879000.0)]
    pub amount: f64,
    /// Sending account number; `0` means not supplied
    #[serde(rename = "internalsource", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 2)]
    pub internal_source: Option<i32>,
    /// Sender email for non-members; empty means not supplied
    #[serde(rename = "externalsource", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "a@b.com")]
    pub external_source: Option<String>,
}

impl CreateTransactionRequest {
    #[must_use]
    pub fn internal(deposit_dest: i32, internal_source: i32, amount: f64) -> Self {
        Self {
            deposit_dest,
            amount,
            internal_source: Some(internal_source),
            external_source: None,
        }
    }

    #[must_use]
    pub fn external(deposit_dest: i32, external_source: impl Into<String>, amount: f64) -> Self {
        Self {
            deposit_dest,
            amount,
            internal_source: None,
            external_source: Some(external_source.into()),
        }
    }

    fn supplied_internal(&self) -> Option<i32> {
        self.internal_source.filter(|id| *id != 0)
    }

    fn supplied_external(&self) -> Option<&str> {
        self.external_source.as_deref().filter(|s| !s.is_empty())
    }

    /// Validates the payload and resolves it into a store-ready deposit.
    ///
    /// Order: account ids in range, external email grammar, amount, then
    /// exactly one source.
    pub fn into_new_transaction(self) -> Result<NewTransaction, ValidationError> {
        if self.deposit_dest < 0 || self.internal_source.is_some_and(|id| id < 0) {
            return Err(ValidationError::InvalidPayload(
                "account ids must not be negative".to_string(),
            ));
        }

        if let Some(email) = self.supplied_external() {
            if !is_valid_email(email) {
                return Err(ValidationError::InvalidEmail);
            }
        }

        self.validate()
            .map_err(|_| ValidationError::InvalidAmount)?;

        let source = match (self.supplied_internal(), self.supplied_external()) {
            (Some(id), None) => TransactionSource::Internal(id),
            (None, Some(email)) => TransactionSource::External(email.to_string()),
            _ => return Err(ValidationError::InvalidSource),
        };

        Ok(NewTransaction {
            deposit_dest: self.deposit_dest,
            amount: self.amount,
            source,
        })
    }
}

/// Validated deposit ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub deposit_dest: i32,
    pub amount: f64,
    pub source: TransactionSource,
}

/// Persisted deposit
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_id: i64,
    pub deposit_dest: i32,
    pub source: TransactionSource,
    /// Internal sender's email, when resolved
    pub source_email: Option<String>,
    /// Internal sender's display name, when resolved
    pub source_name: Option<String>,
    pub amount: f64,
    pub transaction_time: DateTime<Utc>,
}

impl Transaction {
    /// Address the deposit notification goes to.
    #[must_use]
    pub fn notification_recipient(&self) -> Option<&str> {
        self.source_email
            .as_deref()
            .filter(|email| !email.is_empty())
            .or_else(|| self.source.external_email())
    }
}

/// Wire representation of a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TransactionResponse {
    #[serde(rename = "transid")]
    #[schema(example = 1)]
    pub transaction_id: i64,
    #[serde(rename = "depositdest")]
    #[schema(example = 1)]
    pub deposit_dest: i32,
    /// Sender email for external deposits, empty otherwise
    #[serde(rename = "externalsource")]
    #[schema(example = "a@b.com")]
    pub external_source: String,
    /// Sending account for internal deposits, 0 otherwise
    #[serde(rename = "internalsource")]
    #[schema(example = 0)]
    pub internal_source: i32,
    #[serde(rename = "internalsourceemail")]
    #[schema(example = "")]
    pub internal_source_email: String,
    /// Internal sender's display name
    #[schema(example = "")]
    pub name: String,
    #[schema(example = 3879000.0)]
    pub amount: f64,
    #[serde(rename = "transtime")]
    pub transaction_time: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        let (internal_source, external_source) = match tx.source {
            TransactionSource::Internal(id) => (id, String::new()),
            TransactionSource::External(email) => (0, email),
        };
        Self {
            transaction_id: tx.transaction_id,
            deposit_dest: tx.deposit_dest,
            external_source,
            internal_source,
            internal_source_email: tx.source_email.unwrap_or_default(),
            name: tx.source_name.unwrap_or_default(),
            amount: tx.amount,
            transaction_time: tx.transaction_time,
        }
    }
}

/// Plain-text deposit notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl DepositNotification {
    pub const SUBJECT: &'static str = "Cash Deposit Notification";

    /// Composes the notification, or `None` when the deposit has no reachable sender.
    #[must_use]
    pub fn for_transaction(tx: &Transaction) -> Option<Self> {
        let recipient = tx.notification_recipient()?;
        Some(Self {
            recipient: recipient.to_string(),
            subject: Self::SUBJECT.to_string(),
            body: format!(
                "You have successfully deposited {:.2} to account number {}. Ref No. #{}",
                tx.amount, tx.deposit_dest, tx.transaction_id
            ),
        })
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Database health status
    pub database: HealthStatus,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database: HealthStatus) -> Self {
        Self {
            status: database,
            database,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    #[schema(example = "Account not found")]
    pub error: String,
}
