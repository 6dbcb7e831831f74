//! Visit lifecycle: check-in, check-out, and the active-visit queries.
//!
//! All durable state lives in the `visits` table. The only guarded write is
//! the check-out `UPDATE ... WHERE check_out IS NULL`; concurrent check-outs
//! of one visit race there and exactly one wins. Notifications are handed to
//! [`Notifier`](turbinelog_events::Notifier) after the write succeeds and
//! never affect the outcome.

use chrono::Utc;
use turbinelog_core::error::CoreError;
use turbinelog_core::technicians::{require_technicians, TechnicianInput};
use turbinelog_core::time_window::utc_day_bounds;
use turbinelog_core::types::VisitId;
use turbinelog_core::visit::{clean_text, placeholder_turbine_id, VisitStatus, VISIT_ENTITY};
use turbinelog_db::models::visit::{CreateVisit, Visit};
use turbinelog_db::repositories::VisitRepo;
use turbinelog_events::message::VisitEvent;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Raw check-in fields as received; normalized by [`VisitService::check_in`].
#[derive(Debug, Default)]
pub struct CheckInInput {
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

/// A freshly created visit and whether others are active at its site today.
#[derive(Debug)]
pub struct CheckInOutcome {
    pub visit: Visit,
    pub co_activity: bool,
}

/// Visit operations bound to the shared application state.
pub struct VisitService<'a> {
    state: &'a AppState,
}

impl<'a> VisitService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Record a new active visit.
    pub async fn check_in(&self, input: CheckInInput) -> AppResult<CheckInOutcome> {
        let technicians = require_technicians(input.technicians.as_ref())?;
        let status = match clean_text(input.status) {
            Some(raw) => raw.parse::<VisitStatus>()?,
            None => VisitStatus::default(),
        };

        let power_plant = clean_text(input.power_plant);
        if let Some(site) = power_plant.as_deref() {
            if self.state.config.is_site_blocked(site) {
                tracing::warn!(power_plant = site, "Check-in refused at blocked site");
                return Err(AppError::SiteBlocked(format!(
                    "Check-in at {site} is currently blocked"
                )));
            }
        }

        let id = Uuid::new_v4();
        let create = CreateVisit {
            id,
            turbine_id: clean_text(input.turbine_id).unwrap_or_else(|| placeholder_turbine_id(id)),
            technicians,
            reason: clean_text(input.reason),
            comment: clean_text(input.comment),
            power_plant,
            equipment_name: clean_text(input.equipment_name),
            maintenance_company: clean_text(input.maintenance_company),
            malfunction_type: clean_text(input.malfunction_type),
            status,
        };

        let visit = VisitRepo::create(&self.state.pool, &create).await?;
        let co_activity = self.co_activity(&visit).await;

        tracing::info!(
            visit_id = %visit.id,
            turbine_id = %visit.turbine_id,
            power_plant = ?visit.power_plant,
            technicians = visit.technicians.len(),
            co_activity,
            "Visit checked in"
        );

        self.state.notifier.dispatch(VisitEvent::CheckedIn, &visit);

        Ok(CheckInOutcome { visit, co_activity })
    }

    /// Whether another active, same-day IN visit exists at the visit's site.
    ///
    /// Runs after the insert without a transaction, so a concurrent check-in
    /// can be missed. The flag is advisory: a failed count is logged and
    /// reported as `false` rather than failing a check-in already stored.
    async fn co_activity(&self, visit: &Visit) -> bool {
        let Some(site) = visit.power_plant.as_deref() else {
            return false;
        };
        let (day_start, day_end) = utc_day_bounds(Utc::now());
        match VisitRepo::count_other_active_for_site(
            &self.state.pool,
            site,
            visit.id,
            day_start,
            day_end,
        )
        .await
        {
            Ok(others) => others > 0,
            Err(e) => {
                tracing::warn!(error = %e, visit_id = %visit.id, "Co-activity count failed");
                false
            }
        }
    }

    /// Close an active visit and return the closed row.
    ///
    /// Unknown ids, malformed ids, and already closed visits all yield the
    /// same `NotFound`.
    pub async fn check_out(&self, raw_id: &str) -> AppResult<Visit> {
        let id = parse_visit_id(raw_id)?;
        let visit = VisitRepo::check_out(&self.state.pool, id)
            .await?
            .ok_or_else(|| not_found(raw_id))?;

        tracing::info!(
            visit_id = %visit.id,
            turbine_id = %visit.turbine_id,
            power_plant = ?visit.power_plant,
            "Visit checked out"
        );

        self.state.notifier.dispatch(VisitEvent::CheckedOut, &visit);

        Ok(visit)
    }

    /// Fetch a visit in any state.
    pub async fn get(&self, raw_id: &str) -> AppResult<Visit> {
        let id = parse_visit_id(raw_id)?;
        VisitRepo::find_by_id(&self.state.pool, id)
            .await?
            .ok_or_else(|| not_found(raw_id))
    }

    /// Most recent active visit at a turbine.
    pub async fn active_for_turbine(&self, turbine_id: &str) -> AppResult<Option<Visit>> {
        Ok(VisitRepo::find_active_for_turbine(&self.state.pool, turbine_id).await?)
    }

    /// Active IN visits at a power plant checked in today (UTC).
    pub async fn active_for_site(&self, power_plant: &str) -> AppResult<Vec<Visit>> {
        let (day_start, day_end) = utc_day_bounds(Utc::now());
        Ok(VisitRepo::list_active_for_site(&self.state.pool, power_plant, day_start, day_end).await?)
    }
}

/// Malformed ids cannot match any row, so they are reported as not found.
fn parse_visit_id(raw: &str) -> Result<VisitId, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found(raw))
}

fn not_found(raw: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: VISIT_ENTITY,
        id: raw.trim().to_string(),
    })
}
