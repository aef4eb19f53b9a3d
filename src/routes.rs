use crate::{
    delivery::{DeliveryReport, NotificationKind},
    digest::DigestJob,
    notification::{self, DigestSummary, HealthResponse, ScheduleSummary},
    reminder::{ReminderAction, SkipReason},
    state::AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        notification::notification_handlers::schedule_event_notifications,
        notification::notification_handlers::queue_event_update_digest,
        notification::notification_handlers::health,
    ),
    components(
        schemas(
            ScheduleSummary,
            DigestSummary,
            HealthResponse,
            ReminderAction,
            SkipReason,
            DeliveryReport,
            DigestJob,
            NotificationKind,
        )
    ),
    tags(
        (name = "notifications", description = "Reminder and digest scheduling"),
        (name = "health", description = "Liveness of the periodic sweep")
    )
)]
struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let event_routes = Router::new()
        .route(
            "/:church_id/events/:event_id/notifications",
            post(notification::schedule_event_notifications),
        )
        .route(
            "/:church_id/events/:event_id/digest",
            post(notification::queue_event_update_digest),
        );

    let api_routes = Router::new()
        .nest("/churches", event_routes)
        .route("/health", get(notification::health));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
