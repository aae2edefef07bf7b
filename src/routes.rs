use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use http::{Method, header};
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, middleware_layer, state::AppState};

/// Builds the service router: issuance and the attendance list for
/// teachers, the scan endpoint for students, all behind the gateway
/// identity middleware.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            "x-user-id".parse().unwrap(),
            "x-user-role".parse().unwrap(),
        ])
        .max_age(Duration::from_secs(86400));

    let scan_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10_000)
            .burst_size(50_000)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let scan_routes = Router::new()
        .route("/api/attendance/scan", post(handlers::attendance::scan))
        .layer(tower_governor::GovernorLayer::new(scan_governor_conf))
        .route_layer(from_fn(middleware_layer::auth::require_caller))
        .with_state(state.clone());

    let lesson_routes = Router::new()
        .route(
            "/api/lessons/{lesson_id}/qr",
            post(handlers::attendance::issue_session),
        )
        .route(
            "/api/lessons/{lesson_id}/attendance",
            get(handlers::attendance::list_attendance),
        )
        .route_layer(from_fn(middleware_layer::auth::require_caller))
        .with_state(state);

    Router::new()
        .merge(scan_routes)
        .merge(lesson_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors)
}
