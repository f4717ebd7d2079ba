//! Deposit notification channels.

pub mod log;
pub mod smtp;

pub use log::LogNotifier;
pub use smtp::{SmtpConfig, SmtpNotifier};
