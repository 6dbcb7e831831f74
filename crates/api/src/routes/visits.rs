use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::visits;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Visit routes. Only the two state transitions are rate limited.
pub fn router(state: &AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/checkin", post(visits::check_in))
        .route("/checkout", post(visits::check_out))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/active", get(visits::active_for_turbine))
        .route("/active-site", get(visits::active_for_site))
        .route("/{id}", get(visits::get_visit))
        .merge(limited)
}
