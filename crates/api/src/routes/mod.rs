pub mod health;
pub mod visits;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /visits/checkin                    check in (POST, rate limited)
/// /visits/checkout                   check out (POST, rate limited)
/// /visits/active?turbineId=          latest active visit at a turbine (GET)
/// /visits/active-site?powerPlant=    today's active visits at a site (GET)
/// /visits/{id}                       visit by id (GET)
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new().nest("/visits", visits::router(state))
}
