//! Route definitions for the pharmaceutical distribution API

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - order workflow
        .nest("/orders", order_routes(state.clone()))
        // Protected routes - medicine catalogue
        .nest("/medicines", medicine_routes(state.clone()))
        // Protected routes - medical stores
        .nest("/stores", store_routes(state.clone()))
        // Protected routes - restocking
        .nest("/supplies", supply_routes(state.clone()))
        // Protected routes - user administration
        .nest("/users", user_routes(state))
}

/// Order workflow routes (protected)
fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route("/:order_id/approve", put(handlers::approve_order))
        .route("/:order_id/reject", put(handlers::reject_order))
        .route("/:order_id/deliver", put(handlers::deliver_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Medicine catalogue routes (protected)
fn medicine_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_medicines).post(handlers::create_medicine))
        .route("/alerts", get(handlers::medicine_alerts))
        .route(
            "/:medicine_id",
            get(handlers::get_medicine)
                .put(handlers::update_medicine)
                .delete(handlers::delete_medicine),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Medical store routes (protected)
fn store_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stores).post(handlers::create_store))
        .route(
            "/:store_id",
            get(handlers::get_store).put(handlers::update_store),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supply routes (protected)
fn supply_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_supplies).post(handlers::record_supply))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// User administration routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route("/:user_id", get(handlers::get_user))
        .route("/:user_id/capabilities", put(handlers::update_capabilities))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
