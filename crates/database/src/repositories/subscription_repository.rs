use crate::pool::DbPool;
use async_trait::async_trait;
use services::subscription::ports::{Subscription, SubscriptionError, SubscriptionRepository};
use services::MonthDate;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

pub struct PostgresSubscriptionRepository {
    pool: DbPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, SubscriptionError> {
        self.pool
            .get()
            .await
            .map_err(|e| SubscriptionError::Database(format!("failed to get connection: {e}")))
    }
}

/// Map a driver error onto the closed set of subscription errors.
///
/// Only SQLSTATE 23505 (unique_violation) is distinguished; everything else is a
/// storage failure carrying the driver message for logs.
fn classify(err: tokio_postgres::Error, action: &str) -> SubscriptionError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        return SubscriptionError::AlreadyExists;
    }
    SubscriptionError::Database(format!("failed to {action} subscription: {err}"))
}

fn row_to_subscription(row: &Row) -> Subscription {
    Subscription {
        user_id: row.get("user_id"),
        service_name: row.get("service_name"),
        price: row.get("price"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        tracing::info!(
            "Repository: Creating subscription - user_id={}, service_name={}",
            subscription.user_id,
            subscription.service_name
        );

        let client = self.client().await?;

        let row = client
            .query_one(
                "INSERT INTO subscriptions (user_id, service_name, price, start_date, end_date)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING user_id, service_name, price, start_date, end_date",
                &[
                    &subscription.user_id,
                    &subscription.service_name,
                    &subscription.price,
                    &subscription.start_date,
                    &subscription.end_date,
                ],
            )
            .await
            .map_err(|e| classify(e, "create"))?;

        Ok(row_to_subscription(&row))
    }

    async fn get_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        tracing::debug!(
            "Repository: Fetching subscription for user_id={}, service_name={}",
            user_id,
            service_name
        );

        let client = self.client().await?;

        let row = client
            .query_opt(
                "SELECT user_id, service_name, price, start_date, end_date
                 FROM subscriptions
                 WHERE user_id = $1 AND service_name = $2",
                &[&user_id, &service_name],
            )
            .await
            .map_err(|e| classify(e, "get"))?;

        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn update_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, SubscriptionError> {
        tracing::info!(
            "Repository: Updating subscription - user_id={}, service_name={}",
            subscription.user_id,
            subscription.service_name
        );

        let client = self.client().await?;

        let row = client
            .query_opt(
                "UPDATE subscriptions
                 SET price = $1, start_date = $2, end_date = $3
                 WHERE user_id = $4 AND service_name = $5
                 RETURNING user_id, service_name, price, start_date, end_date",
                &[
                    &subscription.price,
                    &subscription.start_date,
                    &subscription.end_date,
                    &subscription.user_id,
                    &subscription.service_name,
                ],
            )
            .await
            .map_err(|e| classify(e, "update"))?;

        row.as_ref()
            .map(row_to_subscription)
            .ok_or(SubscriptionError::NotFound)
    }

    async fn delete_subscription(
        &self,
        user_id: &str,
        service_name: &str,
    ) -> Result<(), SubscriptionError> {
        tracing::info!(
            "Repository: Deleting subscription - user_id={}, service_name={}",
            user_id,
            service_name
        );

        let client = self.client().await?;

        let deleted = client
            .execute(
                "DELETE FROM subscriptions WHERE user_id = $1 AND service_name = $2",
                &[&user_id, &service_name],
            )
            .await
            .map_err(|e| classify(e, "delete"))?;

        tracing::debug!("Repository: Deleted {} subscription row(s)", deleted);

        Ok(())
    }

    async fn list_subscriptions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        tracing::debug!(
            "Repository: Listing subscriptions for user_id={}, limit={}, offset={}",
            user_id,
            limit,
            offset
        );

        let client = self.client().await?;

        let rows = client
            .query(
                "SELECT user_id, service_name, price, start_date, end_date
                 FROM subscriptions
                 WHERE user_id = $1
                 ORDER BY service_name ASC
                 LIMIT $2 OFFSET $3",
                &[&user_id, &limit, &offset],
            )
            .await
            .map_err(|e| classify(e, "list"))?;

        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn total_price(
        &self,
        user_id: &str,
        service_name: Option<&str>,
        from: MonthDate,
        to: MonthDate,
    ) -> Result<i64, SubscriptionError> {
        tracing::debug!(
            "Repository: Summing prices for user_id={}, service_name={:?}, from={}, to={}",
            user_id,
            service_name,
            from,
            to
        );

        let client = self.client().await?;

        // SUM over zero rows is NULL, hence the COALESCE. A sum past i64::MAX
        // fails the BIGINT cast (SQLSTATE 22003) and surfaces as a storage error.
        let row = client
            .query_one(
                "SELECT COALESCE(SUM(price), 0)::BIGINT AS total
                 FROM subscriptions
                 WHERE user_id = $1
                   AND ($2::TEXT IS NULL OR service_name = $2)
                   AND start_date >= $3
                   AND end_date <= $4",
                &[&user_id, &service_name, &from, &to],
            )
            .await
            .map_err(|e| classify(e, "sum prices of"))?;

        Ok(row.get::<_, i64>("total"))
    }
}
