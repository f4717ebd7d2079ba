//! Infrastructure layer implementations.

pub mod database;
pub mod notification;

pub use database::{PostgresClient, PostgresConfig};
pub use notification::{LogNotifier, SmtpConfig, SmtpNotifier};
