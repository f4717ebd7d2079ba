//! Account registry and cash deposit ledger served over HTTP.
//!
//! Layers, leaf-first: [`domain`] (types, validation, errors, traits),
//! [`infra`] (PostgreSQL store, SMTP notifier), [`app`] (service and shared
//! state) and [`api`] (axum handlers and router).

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
