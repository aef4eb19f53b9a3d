use church_notify::{
    db::{create_pool, run_migrations},
    delivery::{DeliveryRepository, EmailSender, LogEmailSender, WebhookEmailSender},
    digest::{DigestQueuer, DigestRepository},
    event::EventRepository,
    notification::{start_notification_sweep, NotificationDeps, NotificationService, SweepHeartbeat},
    reminder::{ReminderEngine, ReminderPolicyRepository},
    routes::create_router,
    state::{AppState, Config},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,church_notify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    let email: Arc<dyn EmailSender> = match &config.email_webhook_url {
        Some(url) => Arc::new(WebhookEmailSender::new(
            url.clone(),
            Duration::from_secs(config.email_timeout_secs),
        )?),
        None => {
            tracing::warn!("EMAIL_WEBHOOK_URL not set, reminders will only be logged");
            Arc::new(LogEmailSender)
        }
    };
    tracing::info!(sender = email.name(), "Email sender ready");

    // Create repositories
    let deps = NotificationDeps {
        events: Arc::new(EventRepository::new(db.clone())),
        policies: Arc::new(ReminderPolicyRepository::new(db.clone())),
        deliveries: Arc::new(DeliveryRepository::new(db.clone())),
        digests: Arc::new(DigestRepository::new(db.clone())),
        email,
    };

    // Create services
    let digests = DigestQueuer::new(
        deps.events.clone(),
        deps.digests.clone(),
        config.default_timezone,
        config.digest_send_time()?,
    );
    let notification_service = Arc::new(NotificationService::new(
        deps,
        ReminderEngine::new(config.send_window()),
        digests,
    ));

    // Start the periodic sweep; the scheduler stops when dropped
    let heartbeat = SweepHeartbeat::new();
    let _sweep = start_notification_sweep(
        notification_service.clone(),
        heartbeat.clone(),
        &config.sweep_cron,
        config.sweep_lookahead(),
    )
    .await?;

    let state = AppState {
        config: config.clone(),
        notification_service,
        heartbeat,
    };

    let app = create_router(state);

    let addr = config.bind_addr();
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
