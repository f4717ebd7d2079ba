//! Additional integration tests for specific request flows.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use cash_deposit_service::api::create_router;
use cash_deposit_service::app::AppState;
use cash_deposit_service::domain::{Account, TransactionResponse};
use cash_deposit_service::test_utils::{MockDatabaseClient, MockNotifier};

struct Harness {
    router: Router,
    notifier: Arc<MockNotifier>,
}

fn create_harness() -> Harness {
    let db = Arc::new(MockDatabaseClient::new());
    let notifier = Arc::new(MockNotifier::new());
    let state = Arc::new(AppState::new(db as _, Arc::clone(&notifier) as _));
    Harness {
        router: create_router(state),
        notifier,
    }
}

impl Harness {
    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_register_then_deposit_scenario() {
    let harness = create_harness();

    // 1. Register Michael
    let (status, body) = harness
        .call(
            "POST",
            "/account",
            Some(json!({"idcardno": "1234567890123456", "name": "Michael", "email": "mike@x.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["accountid"], 1);

    // 2. Deposit from an account that does not exist
    let (status, body) = harness
        .call(
            "POST",
            "/transaction",
            Some(json!({"depositdest": 1, "internalsource": 2, "amount": 100})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Invalid Account ID");

    // 3. Deposit from a non-member
    let (status, body) = harness
        .call(
            "POST",
            "/transaction",
            Some(json!({"depositdest": 1, "externalsource": "a@b.com", "amount": 3879000})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tx: TransactionResponse = serde_json::from_value(body).unwrap();
    assert_eq!(tx.external_source, "a@b.com");

    // 4. Balance reflects the deposit
    let (status, body) = harness.call("GET", "/account/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let account: Account = serde_json::from_value(body).unwrap();
    assert_eq!(account.balance, 3_879_000.0);

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Cash Deposit Notification");
}

#[tokio::test]
async fn test_full_account_lifecycle_flow() {
    let harness = create_harness();

    for (id_card, name, email) in [
        ("1111222233334444", "Alice Smith", "alice@x.com"),
        ("5555666677778888", "Bob Jones", "bob@x.com"),
        ("9999000011112222", "Carol White", "carol@x.com"),
    ] {
        let (status, _) = harness
            .call(
                "POST",
                "/account",
                Some(json!({"idcardno": id_card, "name": name, "email": email})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Bob pays Alice twice, a stranger pays Bob once
    for payload in [
        json!({"depositdest": 1, "internalsource": 2, "amount": 100.25}),
        json!({"depositdest": 2, "externalsource": "stranger@y.org", "amount": 50}),
        json!({"depositdest": 1, "internalsource": 2, "amount": 200}),
    ] {
        let (status, _) = harness.call("POST", "/transaction", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = harness.call("GET", "/account", None).await;
    assert_eq!(status, StatusCode::OK);
    let accounts: Vec<Account> = serde_json::from_value(body).unwrap();
    let order: Vec<i32> = accounts.iter().map(|a| a.account_id).collect();
    // latest deposit first, never-credited accounts last
    assert_eq!(order, vec![1, 2, 3]);
    assert_eq!(accounts[0].balance, 300.25);
    assert_eq!(accounts[1].balance, 50.0);
    assert_eq!(accounts[2].balance, 0.0);

    let (status, body) = harness.call("GET", "/account/1/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<TransactionResponse> = serde_json::from_value(body).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount, 200.0);
    assert!(history.iter().all(|t| t.internal_source == 2));
    assert!(history.iter().all(|t| t.name == "Bob Jones"));

    let (status, body) = harness.call("GET", "/transaction", None).await;
    assert_eq!(status, StatusCode::OK);
    let all: Vec<TransactionResponse> = serde_json::from_value(body).unwrap();
    let ids: Vec<i64> = all.iter().map(|t| t.transaction_id).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    // internal deposits notify the sending account, external ones the given address
    let recipients: Vec<String> = harness
        .notifier
        .sent()
        .into_iter()
        .map(|n| n.recipient)
        .collect();
    assert_eq!(recipients, vec!["bob@x.com", "stranger@y.org", "bob@x.com"]);
}
