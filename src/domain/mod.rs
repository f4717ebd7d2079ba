//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::{AppError, DatabaseError, NotificationError, ValidationError};
pub use traits::{DatabaseClient, Notifier};
pub use types::{
    Account, CreateAccountRequest, CreateTransactionRequest, DepositNotification, ErrorResponse,
    HealthResponse, HealthStatus, NewTransaction, Transaction, TransactionResponse,
    TransactionSource,
};
pub use validation::{is_valid_email, is_valid_id_card, is_valid_name};
