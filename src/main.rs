use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use plan_activation::adapters::http::{api_router, SubscriptionAppState, WebhookAppState};
use plan_activation::adapters::store::{
    FirebaseConfig, FirebaseDocumentStore, InMemoryDocumentStore,
};
use plan_activation::application::handlers::subscription::PlanActivationService;
use plan_activation::application::handlers::webhook::HandleWhopWebhookHandler;
use plan_activation::config::AppConfig;
use plan_activation::domain::webhook::WhopWebhookVerifier;
use plan_activation::ports::DocumentStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let store: Arc<dyn DocumentStore> = match config.database.firebase_url.as_deref() {
        Some(url) if config.database.uses_firebase() => {
            tracing::info!(url, "Using Firebase Realtime Database");
            Arc::new(FirebaseDocumentStore::new(FirebaseConfig::new(
                url,
                config.database.firebase_secret(),
            )))
        }
        _ => {
            tracing::warn!("No database URL configured; using in-memory store");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let activation = Arc::new(PlanActivationService::new(store.clone()));
    let webhook_handler = HandleWhopWebhookHandler::new(
        activation.clone(),
        store,
        WhopWebhookVerifier::new(config.payment.webhook_secret()),
        config.payment.plan_catalog(),
        config.activation.retry_policy(),
    );

    let admin_api_key = config.payment.admin_api_key();
    if admin_api_key.is_none() {
        tracing::info!("Admin API key not set; admin endpoints disabled");
    }

    let app = api_router(
        WebhookAppState::new(Arc::new(webhook_handler)),
        SubscriptionAppState::new(activation, admin_api_key),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Plan activation service listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
