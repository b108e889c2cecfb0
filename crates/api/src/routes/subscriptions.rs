use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use services::subscription::ports::{Subscription, SubscriptionError};
use services::MonthDate;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ApiError, ApiErrorResponse},
    extract::JsonBody,
    state::AppState,
    validation::{
        validate_period, validate_price, validate_service_name, validate_uuid_v4, Validate,
        ValidationErrors,
    },
};

/// Page size used when `limit` is absent, malformed or not positive
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Request to create a subscription
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    /// Owner of the subscription (UUID v4)
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    /// Monthly price in whole currency units
    #[schema(example = 400)]
    pub price: i64,
    /// First month of the subscription, `MM-YYYY`
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: MonthDate,
    /// Last month of the subscription, `MM-YYYY`. Omit for open-ended subscriptions.
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<MonthDate>,
}

impl Validate for CreateSubscriptionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("user_id", validate_uuid_v4(&self.user_id));
        errors.check("service_name", validate_service_name(&self.service_name));
        errors.check("price", validate_price(self.price));
        errors.check("end_date", validate_period(self.start_date, self.end_date));
        errors.into_result()
    }
}

impl From<CreateSubscriptionRequest> for Subscription {
    fn from(req: CreateSubscriptionRequest) -> Self {
        Subscription {
            user_id: req.user_id,
            service_name: req.service_name,
            price: req.price,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

/// Request to replace the mutable fields of a subscription
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    #[schema(example = 450)]
    pub price: i64,
    #[schema(value_type = String, example = "08-2025")]
    pub start_date: MonthDate,
    /// Omitting this field makes the subscription open-ended
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<MonthDate>,
}

impl Validate for UpdateSubscriptionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("price", validate_price(self.price));
        errors.check("end_date", validate_period(self.start_date, self.end_date));
        errors.into_result()
    }
}

/// Subscription as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 400)]
    pub price: i64,
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: MonthDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<MonthDate>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            user_id: subscription.user_id,
            service_name: subscription.service_name,
            price: subscription.price,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
        }
    }
}

/// Sum of matching subscription prices
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TotalPriceResponse {
    #[schema(example = 650)]
    pub total: i64,
}

/// Query parameters for listing subscriptions.
///
/// `limit` and `offset` are read leniently: anything that is not a valid
/// number falls back to the default.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionsParams {
    /// Owner whose subscriptions are listed
    pub user_id: Option<String>,
    /// Page size, defaults to 20
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
    /// Number of records to skip, defaults to 0
    #[param(value_type = Option<i64>)]
    pub offset: Option<String>,
}

/// Query parameters for the total price report
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalPriceParams {
    /// Owner whose subscriptions are summed
    pub user_id: Option<String>,
    /// Restrict the sum to one service; empty or absent means all services
    pub service_name: Option<String>,
    /// Earliest start month, `MM-YYYY`
    pub from: Option<String>,
    /// Latest end month, `MM-YYYY`
    pub to: Option<String>,
}

fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIST_LIMIT)
}

fn parse_offset(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|offset| *offset >= 0)
        .unwrap_or(0)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_month_param(name: &str, raw: &str) -> Result<MonthDate, ApiError> {
    raw.parse::<MonthDate>().map_err(|_| {
        ApiError::bad_request(format!(
            "invalid {name} date format, expected {}",
            MonthDate::FORMAT
        ))
    })
}

/// Map a service failure onto an HTTP error. Storage failures are logged and
/// answered with a generic message.
fn map_service_error(err: SubscriptionError, action: &'static str) -> ApiError {
    match err {
        SubscriptionError::AlreadyExists => ApiError::bad_request(err.to_string()),
        SubscriptionError::NotFound => ApiError::not_found(err.to_string()),
        SubscriptionError::Database(message) => {
            tracing::error!(action, error = %message, "Subscription storage failure");
            ApiError::internal_server_error(format!("failed to {action}"))
        }
    }
}

fn require_key(user_id: &str, service_name: &str) -> Result<(), ApiError> {
    if user_id.is_empty() || service_name.is_empty() {
        return Err(ApiError::bad_request("missing user_id or service_name"));
    }
    Ok(())
}

/// Answers keyed routes whose service name segment is empty (`/subscriptions/{user_id}/`)
async fn missing_path_segment() -> ApiError {
    ApiError::bad_request("missing user_id or service_name")
}

/// Create a subscription
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse),
        (status = 400, description = "Invalid body or subscription already exists", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    )
)]
pub async fn create_subscription(
    State(app_state): State<AppState>,
    JsonBody(request): JsonBody<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    request.validate()?;

    let subscription = app_state
        .subscription_service
        .create_subscription(request.into())
        .await
        .map_err(|e| map_service_error(e, "create subscription"))?;

    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// Get one subscription
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{user_id}/{service_name}",
    tag = "Subscriptions",
    params(
        ("user_id" = String, Path, description = "Owner of the subscription"),
        ("service_name" = String, Path, description = "Subscribed service")
    ),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 400, description = "Missing path parameters", body = ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    )
)]
pub async fn get_subscription(
    State(app_state): State<AppState>,
    Path((user_id, service_name)): Path<(String, String)>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    require_key(&user_id, &service_name)?;

    let subscription = app_state
        .subscription_service
        .get_subscription(&user_id, &service_name)
        .await
        .map_err(|e| map_service_error(e, "get subscription"))?
        .ok_or_else(|| ApiError::not_found(SubscriptionError::NotFound.to_string()))?;

    Ok(Json(subscription.into()))
}

/// Replace price and period of an existing subscription
#[utoipa::path(
    put,
    path = "/api/v1/subscriptions/{user_id}/{service_name}",
    tag = "Subscriptions",
    params(
        ("user_id" = String, Path, description = "Owner of the subscription"),
        ("service_name" = String, Path, description = "Subscribed service")
    ),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = SubscriptionResponse),
        (status = 400, description = "Invalid body or path", body = ApiErrorResponse),
        (status = 404, description = "Subscription not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    )
)]
pub async fn update_subscription(
    State(app_state): State<AppState>,
    Path((user_id, service_name)): Path<(String, String)>,
    JsonBody(request): JsonBody<UpdateSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    require_key(&user_id, &service_name)?;
    request.validate()?;

    let subscription = Subscription {
        user_id,
        service_name,
        price: request.price,
        start_date: request.start_date,
        end_date: request.end_date,
    };

    let updated = app_state
        .subscription_service
        .update_subscription(subscription)
        .await
        .map_err(|e| map_service_error(e, "update subscription"))?;

    Ok(Json(updated.into()))
}

/// Delete a subscription. Deleting a missing subscription succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{user_id}/{service_name}",
    tag = "Subscriptions",
    params(
        ("user_id" = String, Path, description = "Owner of the subscription"),
        ("service_name" = String, Path, description = "Subscribed service")
    ),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 400, description = "Missing path parameters", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    )
)]
pub async fn delete_subscription(
    State(app_state): State<AppState>,
    Path((user_id, service_name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    require_key(&user_id, &service_name)?;

    app_state
        .subscription_service
        .delete_subscription(&user_id, &service_name)
        .await
        .map_err(|e| map_service_error(e, "delete subscription"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a user's subscriptions ordered by service name
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    params(ListSubscriptionsParams),
    responses(
        (status = 200, description = "One page of subscriptions", body = Vec<SubscriptionResponse>),
        (status = 400, description = "Missing user_id", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    )
)]
pub async fn list_subscriptions(
    State(app_state): State<AppState>,
    Query(params): Query<ListSubscriptionsParams>,
) -> Result<Json<Vec<SubscriptionResponse>>, ApiError> {
    let user_id = non_empty(params.user_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("missing user_id"))?;
    let limit = parse_limit(params.limit.as_deref());
    let offset = parse_offset(params.offset.as_deref());

    let subscriptions = app_state
        .subscription_service
        .list_subscriptions(user_id, limit, offset)
        .await
        .map_err(|e| map_service_error(e, "list subscriptions"))?;

    Ok(Json(
        subscriptions
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
    ))
}

/// Sum the prices of subscriptions that start no earlier than `from` and end
/// no later than `to`. Open-ended subscriptions are never counted.
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/total",
    tag = "Subscriptions",
    params(TotalPriceParams),
    responses(
        (status = 200, description = "Total price", body = TotalPriceResponse),
        (status = 400, description = "Missing or malformed from/to", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    )
)]
pub async fn total_price(
    State(app_state): State<AppState>,
    Query(params): Query<TotalPriceParams>,
) -> Result<Json<TotalPriceResponse>, ApiError> {
    // An absent user_id sums over nobody and yields 0
    let user_id = params.user_id.as_deref().unwrap_or_default();

    let (Some(from), Some(to)) = (
        non_empty(params.from.as_deref()),
        non_empty(params.to.as_deref()),
    ) else {
        return Err(ApiError::bad_request("missing from or to date"));
    };
    let from = parse_month_param("from", from)?;
    let to = parse_month_param("to", to)?;
    let service_name = non_empty(params.service_name.as_deref());

    let total = app_state
        .subscription_service
        .total_price(user_id, service_name, from, to)
        .await
        .map_err(|e| map_service_error(e, "calculate total price"))?;

    Ok(Json(TotalPriceResponse { total }))
}

/// Subscription routes, relative to the API version prefix
pub fn create_subscriptions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route("/subscriptions/total", get(total_price))
        .route(
            "/subscriptions/{user_id}/",
            get(missing_path_segment)
                .put(missing_path_segment)
                .delete(missing_path_segment),
        )
        .route(
            "/subscriptions/{user_id}/{service_name}",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
}
