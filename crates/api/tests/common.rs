#![allow(dead_code)]

use api::{create_router, create_router_with_timeout, AppState};
use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use services::subscription::ports::{
    Subscription, SubscriptionError, SubscriptionRepository, SubscriptionService,
};
use services::subscription::{test_helpers::InMemorySubscriptionRepository, SubscriptionServiceImpl};
use services::MonthDate;
use std::sync::Arc;
use std::time::Duration;

pub const SUBSCRIPTIONS_PATH: &str = "/api/v1/subscriptions";

/// Create a test server over a fresh in-memory repository
pub fn create_test_server() -> TestServer {
    create_test_server_and_repo().0
}

/// Create a test server and hand back its repository for direct inspection
pub fn create_test_server_and_repo() -> (TestServer, Arc<InMemorySubscriptionRepository>) {
    let repo = Arc::new(InMemorySubscriptionRepository::new());
    let server = create_test_server_with_repo(repo.clone());
    (server, repo)
}

fn app_state(repo: Arc<dyn SubscriptionRepository>) -> AppState {
    let subscription_service: Arc<dyn SubscriptionService> =
        Arc::new(SubscriptionServiceImpl::new(repo));
    AppState {
        subscription_service,
    }
}

pub fn create_test_server_with_repo(repo: Arc<dyn SubscriptionRepository>) -> TestServer {
    TestServer::new(create_router(app_state(repo))).expect("Failed to create test server")
}

/// Test server whose requests are cut off after `request_timeout`
pub fn create_test_server_with_timeout(
    repo: Arc<dyn SubscriptionRepository>,
    request_timeout: Duration,
) -> TestServer {
    TestServer::new(create_router_with_timeout(app_state(repo), request_timeout))
        .expect("Failed to create test server")
}

/// A fresh user id, so tests never see each other's records
pub fn new_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn subscription_path(user_id: &str, service_name: &str) -> String {
    format!("{SUBSCRIPTIONS_PATH}/{user_id}/{service_name}")
}

pub fn create_body(
    user_id: &str,
    service_name: &str,
    price: i64,
    start_date: &str,
    end_date: Option<&str>,
) -> Value {
    let mut body = json!({
        "user_id": user_id,
        "service_name": service_name,
        "price": price,
        "start_date": start_date,
    });
    if let Some(end_date) = end_date {
        body["end_date"] = json!(end_date);
    }
    body
}

/// Create a subscription through the API and assert it was accepted
pub async fn create_subscription(
    server: &TestServer,
    user_id: &str,
    service_name: &str,
    price: i64,
    start_date: &str,
    end_date: Option<&str>,
) -> Value {
    let response = server
        .post(SUBSCRIPTIONS_PATH)
        .json(&create_body(user_id, service_name, price, start_date, end_date))
        .await;
    assert_eq!(
        response.status_code(),
        201,
        "create failed: {}",
        response.text()
    );
    response.json::<Value>()
}

/// Repository that fails every call with a driver-like message
pub struct FailingRepository;

pub const FAILING_REPOSITORY_MESSAGE: &str = "connection to server at 10.0.0.5 refused";

fn failure() -> SubscriptionError {
    SubscriptionError::Database(FAILING_REPOSITORY_MESSAGE.to_string())
}

#[async_trait]
impl SubscriptionRepository for FailingRepository {
    async fn create_subscription(
        &self,
        _subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        Err(failure())
    }

    async fn get_subscription(
        &self,
        _user_id: &str,
        _service_name: &str,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        Err(failure())
    }

    async fn update_subscription(
        &self,
        _subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        Err(failure())
    }

    async fn delete_subscription(
        &self,
        _user_id: &str,
        _service_name: &str,
    ) -> Result<(), SubscriptionError> {
        Err(failure())
    }

    async fn list_subscriptions(
        &self,
        _user_id: &str,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        Err(failure())
    }

    async fn total_price(
        &self,
        _user_id: &str,
        _service_name: Option<&str>,
        _from: MonthDate,
        _to: MonthDate,
    ) -> Result<i64, SubscriptionError> {
        Err(failure())
    }
}

/// In-memory repository whose list call stalls for `delay` before answering
pub struct SlowRepository {
    inner: InMemorySubscriptionRepository,
    delay: Duration,
}

impl SlowRepository {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemorySubscriptionRepository::new(),
            delay,
        }
    }
}

#[async_trait]
impl SubscriptionRepository for SlowRepository {
    async fn create_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        self.inner.create_subscription(subscription).await
    }

    async fn get_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        self.inner.get_subscription(user_id, service_name).await
    }

    async fn update_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        self.inner.update_subscription(subscription).await
    }

    async fn delete_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<(), SubscriptionError> {
        self.inner.delete_subscription(user_id, service_name).await
    }

    async fn list_subscriptions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_subscriptions(user_id, limit, offset).await
    }

    async fn total_price(
        &self,
        user_id: &str,
        service_name: Option<&str>,
        from: MonthDate,
        to: MonthDate,
    ) -> Result<i64, SubscriptionError> {
        self.inner
            .total_price(user_id, service_name, from, to)
            .await
    }
}
