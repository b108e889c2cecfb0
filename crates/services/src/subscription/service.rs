use async_trait::async_trait;
use std::sync::Arc;

use super::ports::{Subscription, SubscriptionError, SubscriptionRepository, SubscriptionService};
use crate::types::MonthDate;

pub struct SubscriptionServiceImpl {
    subscription_repository: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionServiceImpl {
    pub fn new(subscription_repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            subscription_repository,
        }
    }
}

#[async_trait]
impl SubscriptionService for SubscriptionServiceImpl {
    async fn create_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        tracing::info!(
            "Creating subscription: user_id={}, service_name={}",
            subscription.user_id,
            subscription.service_name
        );

        self.subscription_repository
            .create_subscription(subscription)
            .await
    }

    async fn get_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        tracing::debug!(
            "Getting subscription: user_id={}, service_name={}",
            user_id,
            service_name
        );

        self.subscription_repository
            .get_subscription(user_id, service_name)
            .await
    }

    async fn update_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        tracing::info!(
            "Updating subscription: user_id={}, service_name={}",
            subscription.user_id,
            subscription.service_name
        );

        self.subscription_repository
            .update_subscription(subscription)
            .await
    }

    async fn delete_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<(), SubscriptionError> {
        tracing::info!(
            "Deleting subscription: user_id={}, service_name={}",
            user_id,
            service_name
        );

        self.subscription_repository
            .delete_subscription(user_id, service_name)
            .await
    }

    async fn list_subscriptions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        tracing::debug!(
            "Listing subscriptions: user_id={}, limit={}, offset={}",
            user_id,
            limit,
            offset
        );

        self.subscription_repository
            .list_subscriptions(user_id, limit, offset)
            .await
    }

    async fn total_price(
        &self,
        user_id: &str,
        service_name: Option<&str>,
        from: MonthDate,
        to: MonthDate,
    ) -> Result<i64, SubscriptionError> {
        tracing::debug!(
            "Calculating total price: user_id={}, service_name={:?}, from={}, to={}",
            user_id,
            service_name,
            from,
            to
        );

        self.subscription_repository
            .total_price(user_id, service_name, from, to)
            .await
    }
}

/// Test helpers for subscription storage
pub mod test_helpers {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    /// In-memory repository with the same contract as the PostgreSQL one.
    ///
    /// Records are keyed by `(user_id, service_name)`, so iteration order matches
    /// `ORDER BY service_name` within one user.
    #[derive(Default)]
    pub struct InMemorySubscriptionRepository {
        records: RwLock<BTreeMap<(String, String), Subscription>>,
    }

    impl InMemorySubscriptionRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of stored records across all users
        pub async fn len(&self) -> usize {
            self.records.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.records.read().await.is_empty()
        }
    }

    fn key(user_id: &str, service_name: &str) -> (String, String) {
        (user_id.to_string(), service_name.to_string())
    }

    #[async_trait]
    impl SubscriptionRepository for InMemorySubscriptionRepository {
        async fn create_subscription(
            &self,
            subscription: Subscription,
        ) -> Result<Subscription, SubscriptionError> {
            let mut records = self.records.write().await;
            let key = key(&subscription.user_id, &subscription.service_name);
            if records.contains_key(&key) {
                return Err(SubscriptionError::AlreadyExists);
            }
            records.insert(key, subscription.clone());
            Ok(subscription)
        }

        async fn get_subscription(
            &self,
            user_id: &str,
            service_name: &str,
        ) -> Result<Option<Subscription>, SubscriptionError> {
            let records = self.records.read().await;
            Ok(records.get(&key(user_id, service_name)).cloned())
        }

        async fn update_subscription(
            &self,
            subscription: Subscription,
        ) -> Result<Subscription, SubscriptionError> {
            let mut records = self.records.write().await;
            let stored = records
                .get_mut(&key(&subscription.user_id, &subscription.service_name))
                .ok_or(SubscriptionError::NotFound)?;
            stored.price = subscription.price;
            stored.start_date = subscription.start_date;
            stored.end_date = subscription.end_date;
            Ok(stored.clone())
        }

        async fn delete_subscription(
            &self,
            user_id: &str,
            service_name: &str,
        ) -> Result<(), SubscriptionError> {
            self.records
                .write()
                .await
                .remove(&key(user_id, service_name));
            Ok(())
        }

        async fn list_subscriptions(
            &self,
            user_id: &str,
            limit: i64,
            offset: i64,
        ) -> Result<Vec<Subscription>, SubscriptionError> {
            let records = self.records.read().await;
            Ok(records
                .values()
                .filter(|s| s.user_id == user_id)
                .skip(usize::try_from(offset).unwrap_or(0))
                .take(usize::try_from(limit).unwrap_or(0))
                .cloned()
                .collect())
        }

        async fn total_price(
            &self,
            user_id: &str,
            service_name: Option<&str>,
            from: MonthDate,
            to: MonthDate,
        ) -> Result<i64, SubscriptionError> {
            let records = self.records.read().await;
            // Overflow fails like the BIGINT cast in PostgreSQL
            records
                .values()
                .filter(|s| s.user_id == user_id)
                .filter(|s| service_name.map_or(true, |name| s.service_name == name))
                .filter(|s| s.start_date >= from)
                .filter(|s| s.end_date.is_some_and(|end| end <= to))
                .try_fold(0i64, |total, s| total.checked_add(s.price))
                .ok_or_else(|| {
                    SubscriptionError::Database("total price is out of range for bigint".into())
                })
        }
    }
}
