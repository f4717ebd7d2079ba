//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    Account, AppError, CreateAccountRequest, CreateTransactionRequest, DatabaseError,
    ErrorResponse, HealthResponse, HealthStatus, TransactionResponse, ValidationError,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cash Deposit Service API",
        version = "0.1.0",
        description = "Account registration and cash deposit tracking",
        license(
            name = "MIT"
        )
    ),
    paths(
        list_accounts_handler,
        get_account_handler,
        create_account_handler,
        list_transactions_handler,
        create_transaction_handler,
        get_account_history_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            Account,
            CreateAccountRequest,
            CreateTransactionRequest,
            TransactionResponse,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
        )
    ),
    tags(
        (name = "accounts", description = "Account registration and lookup"),
        (name = "transactions", description = "Cash deposits"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Path ids are non-negative 32-bit integers.
fn parse_account_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<u32>()
        .ok()
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| AppError::Validation(ValidationError::InvalidAccountId(raw.to_string())))
}

/// Bodies are decoded as JSON whatever `Content-Type` says.
fn decode_payload<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(reason = %e, "Rejected request payload");
        AppError::Validation(ValidationError::InvalidPayload(e.to_string()))
    })
}

/// List all accounts
///
/// Accounts are ordered by their most recent deposit, newest first.
#[utoipa::path(
    get,
    path = "/account",
    tag = "accounts",
    responses(
        (status = 200, description = "All accounts with balances", body = [Account]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_accounts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.service.list_accounts().await?;
    Ok(Json(accounts))
}

/// Get a single account with its balance
#[utoipa::path(
    get,
    path = "/account/{id}",
    tag = "accounts",
    params(
        ("id" = i32, Path, description = "Account number")
    ),
    responses(
        (status = 200, description = "Account found", body = Account),
        (status = 400, description = "Non-numeric account id", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_account_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, AppError> {
    let account_id = parse_account_id(&id)?;
    let account = state.service.get_account(account_id).await?;
    Ok(Json(account))
}

/// Register a new account
///
/// Fields are checked in order (id card, name, email) and the first
/// failure is reported.
#[utoipa::path(
    post,
    path = "/account",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Malformed payload, invalid field, or duplicate id card", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_account_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let request: CreateAccountRequest = decode_payload(&body)?;
    let account = state.service.create_account(&request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// List all deposits, newest first
#[utoipa::path(
    get,
    path = "/transaction",
    tag = "transactions",
    responses(
        (status = 200, description = "All deposits", body = [TransactionResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_transactions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = state.service.list_transactions().await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// Record a deposit
///
/// Exactly one of `internalsource` (a registered account) or
/// `externalsource` (an email address) identifies the sender. The sender is
/// notified by email once the deposit is stored; a failed notification does
/// not fail the request.
#[utoipa::path(
    post,
    path = "/transaction",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Deposit recorded", body = TransactionResponse),
        (status = 400, description = "Malformed payload, invalid email, amount or source", body = ErrorResponse),
        (status = 404, description = "Destination or source account does not exist", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_transaction_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let request: CreateTransactionRequest = decode_payload(&body)?;
    let transaction = state.service.create_transaction(request).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// Deposit history of one account, newest first
#[utoipa::path(
    get,
    path = "/account/{id}/history",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Account number")
    ),
    responses(
        (status = 200, description = "Deposits into the account", body = [TransactionResponse]),
        (status = 400, description = "Non-numeric account id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_account_history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let account_id = parse_account_id(&id)?;
    let history = state.service.get_account_history(account_id).await?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl AppError {
    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(db_err) => match db_err {
                DatabaseError::DuplicateAccount(_) => StatusCode::BAD_REQUEST,
                DatabaseError::AccountNotFound(_) | DatabaseError::InvalidAccountReference(_) => {
                    StatusCode::NOT_FOUND
                }
                DatabaseError::Connection(_)
                | DatabaseError::Query(_)
                | DatabaseError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = %status, message = %message, "Server error");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
