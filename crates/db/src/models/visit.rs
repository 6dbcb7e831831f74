//! Visit entity model and insert DTO.

use serde::Serialize;
use sqlx::FromRow;
use turbinelog_core::types::{Timestamp, VisitId};
use turbinelog_core::visit::VisitStatus;

/// One physical presence episode of a technician crew at a turbine.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: VisitId,
    pub turbine_id: String,
    pub technicians: Vec<String>,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub power_plant: Option<String>,
    pub equipment_name: Option<String>,
    pub maintenance_company: Option<String>,
    pub malfunction_type: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: VisitStatus,
    pub check_in: Timestamp,
    pub check_out: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new visit. Fields are already normalized.
#[derive(Debug, Clone)]
pub struct CreateVisit {
    pub id: VisitId,
    pub turbine_id: String,
    pub technicians: Vec<String>,
    pub reason: Option<String>,
    pub comment: Option<String>,
    pub power_plant: Option<String>,
    pub equipment_name: Option<String>,
    pub maintenance_company: Option<String>,
    pub malfunction_type: Option<String>,
    pub status: VisitStatus,
}
