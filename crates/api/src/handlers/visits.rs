//! Handlers for the `/visits` resource.
//!
//! Thin wrappers: extract and validate request shape, call
//! [`VisitService`], and wrap the result in the wire envelope.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use turbinelog_core::technicians::TechnicianInput;
use turbinelog_core::types::{Timestamp, VisitId};
use turbinelog_db::models::visit::Visit;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::service::{CheckInInput, VisitService};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /visits/checkin`.
///
/// `technicians` accepts a JSON array or a comma-separated string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    #[serde(default)]
    pub technicians: Option<TechnicianInput>,
    pub turbine_id: Option<String>,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub power_plant: Option<String>,
    pub equipment_name: Option<String>,
    pub maintenance_company: Option<String>,
    pub status: Option<String>,
    pub malfunction_type: Option<String>,
}

impl From<CheckInRequest> for CheckInInput {
    fn from(req: CheckInRequest) -> Self {
        Self {
            technicians: req.technicians,
            turbine_id: req.turbine_id,
            reason: req.reason,
            comment: req.comment,
            power_plant: req.power_plant,
            equipment_name: req.equipment_name,
            maintenance_company: req.maintenance_company,
            status: req.status,
            malfunction_type: req.malfunction_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub visit: Visit,
    pub co_activity: bool,
}

/// Request body for `POST /visits/checkout`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    pub visit_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutResponse {
    pub visit_id: VisitId,
    pub check_out: Timestamp,
}

/// `{ "visit": ... }` envelope; `null` when no visit matches.
#[derive(Debug, Serialize)]
pub struct VisitResponse<T: Serialize> {
    pub visit: T,
}

#[derive(Debug, Serialize)]
pub struct SiteVisitsResponse {
    pub count: usize,
    pub visits: Vec<Visit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTurbineQuery {
    pub turbine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSiteQuery {
    pub power_plant: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /visits/checkin
pub async fn check_in(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CheckInRequest>,
) -> AppResult<(StatusCode, Json<CheckInResponse>)> {
    let outcome = VisitService::new(&state).check_in(input.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse {
            visit: outcome.visit,
            co_activity: outcome.co_activity,
        }),
    ))
}

/// POST /visits/checkout
pub async fn check_out(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CheckOutRequest>,
) -> AppResult<Json<CheckOutResponse>> {
    let visit_id = required(input.visit_id, "visitId is required")?;
    let visit = VisitService::new(&state).check_out(&visit_id).await?;

    let check_out = visit.check_out.ok_or_else(|| {
        AppError::InternalError(format!("visit {} closed without a check_out time", visit.id))
    })?;

    Ok(Json(CheckOutResponse {
        visit_id: visit.id,
        check_out,
    }))
}

/// GET /visits/{id}
pub async fn get_visit(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<VisitResponse<Visit>>> {
    let visit = VisitService::new(&state).get(&id).await?;
    Ok(Json(VisitResponse { visit }))
}

/// GET /visits/active?turbineId=
pub async fn active_for_turbine(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ActiveTurbineQuery>,
) -> AppResult<Json<VisitResponse<Option<Visit>>>> {
    let turbine_id = required(query.turbine_id, "turbineId query parameter is required")?;
    let visit = VisitService::new(&state)
        .active_for_turbine(&turbine_id)
        .await?;
    Ok(Json(VisitResponse { visit }))
}

/// GET /visits/active-site?powerPlant=
pub async fn active_for_site(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ActiveSiteQuery>,
) -> AppResult<Json<SiteVisitsResponse>> {
    let power_plant = required(query.power_plant, "powerPlant query parameter is required")?;
    let visits = VisitService::new(&state)
        .active_for_site(&power_plant)
        .await?;
    Ok(Json(SiteVisitsResponse {
        count: visits.len(),
        visits,
    }))
}

/// Trim a required string parameter, rejecting absent or blank values.
fn required(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}
