use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Subscriptions API",
        description = "Aggregates users' online subscriptions and reports their total cost.",
        version = "1.0.0",
        license(name = "MIT",)
    ),
    paths(
        crate::routes::health_check,
        crate::routes::subscriptions::create_subscription,
        crate::routes::subscriptions::get_subscription,
        crate::routes::subscriptions::update_subscription,
        crate::routes::subscriptions::delete_subscription,
        crate::routes::subscriptions::list_subscriptions,
        crate::routes::subscriptions::total_price,
    ),
    components(schemas(
        crate::routes::HealthResponse,
        crate::routes::subscriptions::CreateSubscriptionRequest,
        crate::routes::subscriptions::UpdateSubscriptionRequest,
        crate::routes::subscriptions::SubscriptionResponse,
        crate::routes::subscriptions::TotalPriceResponse,
        crate::error::ApiErrorResponse,
    )),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Subscriptions", description = "User subscription records and cost reports")
    )
)]
pub struct ApiDoc;
