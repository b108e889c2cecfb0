use async_trait::async_trait;

use crate::types::MonthDate;

/// A user's subscription to a named service.
///
/// `(user_id, service_name)` is the natural key: at most one record exists per pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: String,
    pub service_name: String,
    pub price: i64,
    pub start_date: MonthDate,
    /// `None` means the subscription is still active
    pub end_date: Option<MonthDate>,
}

/// Error types for subscription operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// A subscription with the same natural key is already stored
    #[error("subscription already exists")]
    AlreadyExists,
    /// No subscription matches the natural key
    #[error("subscription not found")]
    NotFound,
    /// Storage failure (connectivity, driver or unexpected SQL error)
    #[error("database error: {0}")]
    Database(String),
}

/// Repository trait for subscription records
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new subscription. Fails with `AlreadyExists` when the key is taken.
    async fn create_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError>;

    /// Fetch one subscription by natural key; `Ok(None)` when absent
    async fn get_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<Option<Subscription>, SubscriptionError>;

    /// Overwrite price and period of an existing subscription.
    /// Fails with `NotFound` when no record matches the key.
    async fn update_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError>;

    /// Delete by natural key. Deleting a missing record is not an error.
    async fn delete_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<(), SubscriptionError>;

    /// Page through a user's subscriptions ordered by service name
    async fn list_subscriptions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscription>, SubscriptionError>;

    /// Sum of prices for subscriptions with `start_date >= from` and `end_date <= to`.
    ///
    /// Open-ended subscriptions (no `end_date`) never match. `service_name = None`
    /// covers every service of the user. No matching rows yields `0`. A sum that
    /// does not fit in `i64` is a `Database` error.
    async fn total_price(
        &self,
        user_id: &str,
        service_name: Option<&str>,
        from: MonthDate,
        to: MonthDate,
    ) -> Result<i64, SubscriptionError>;
}

/// Service trait for subscription management
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn create_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError>;

    async fn get_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<Option<Subscription>, SubscriptionError>;

    async fn update_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError>;

    async fn delete_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<(), SubscriptionError>;

    async fn list_subscriptions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscription>, SubscriptionError>;

    /// Calculate total price for a period, optionally for a single service
    async fn total_price(
        &self,
        user_id: &str,
        service_name: Option<&str>,
        from: MonthDate,
        to: MonthDate,
    ) -> Result<i64, SubscriptionError>;
}
