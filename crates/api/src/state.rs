use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub subscription_service: Arc<dyn services::subscription::ports::SubscriptionService>,
}
