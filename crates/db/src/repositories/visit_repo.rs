//! Repository for the `visits` table.

use sqlx::PgPool;
use turbinelog_core::types::{Timestamp, VisitId};

use crate::models::visit::{CreateVisit, Visit};

/// Column list for `visits` queries.
const COLUMNS: &str = "\
    id, turbine_id, technicians, reason, comment, power_plant, \
    equipment_name, maintenance_company, malfunction_type, status, \
    check_in, check_out, created_at";

/// Filter shared by the co-activity list and count: active, flagged IN,
/// checked in within `[$2, $3)`.
const SITE_ACTIVE_FILTER: &str = "\
    power_plant = $1 \
    AND check_out IS NULL \
    AND UPPER(status) = 'IN' \
    AND check_in >= $2 AND check_in < $3";

/// Provides query operations for visits.
pub struct VisitRepo;

impl VisitRepo {
    /// Insert a new active visit. `check_in` is taken from the database clock.
    pub async fn create(pool: &PgPool, input: &CreateVisit) -> Result<Visit, sqlx::Error> {
        let query = format!(
            "INSERT INTO visits \
                (id, turbine_id, technicians, reason, comment, power_plant, \
                 equipment_name, maintenance_company, malfunction_type, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(input.id)
            .bind(&input.turbine_id)
            .bind(&input.technicians)
            .bind(&input.reason)
            .bind(&input.comment)
            .bind(&input.power_plant)
            .bind(&input.equipment_name)
            .bind(&input.maintenance_company)
            .bind(&input.malfunction_type)
            .bind(input.status.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a visit by id regardless of its state.
    pub async fn find_by_id(pool: &PgPool, id: VisitId) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM visits WHERE id = $1");
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Close an active visit.
    ///
    /// The `check_out IS NULL` guard makes this the only write that can set
    /// `check_out`. Returns `None` when the id is unknown or already closed;
    /// of several concurrent calls for one visit exactly one gets `Some`.
    pub async fn check_out(pool: &PgPool, id: VisitId) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "UPDATE visits SET check_out = NOW() \
             WHERE id = $1 AND check_out IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent active visit for a turbine, if any.
    pub async fn find_active_for_turbine(
        pool: &PgPool,
        turbine_id: &str,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visits \
             WHERE turbine_id = $1 AND check_out IS NULL \
             ORDER BY check_in DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(turbine_id)
            .fetch_optional(pool)
            .await
    }

    /// Active IN visits at a power plant checked in within `[day_start, day_end)`,
    /// oldest first.
    pub async fn list_active_for_site(
        pool: &PgPool,
        power_plant: &str,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<Vec<Visit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visits \
             WHERE {SITE_ACTIVE_FILTER} \
             ORDER BY check_in ASC"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(power_plant)
            .bind(day_start)
            .bind(day_end)
            .fetch_all(pool)
            .await
    }

    /// Count the same visits as [`list_active_for_site`](Self::list_active_for_site),
    /// excluding `exclude_id`.
    pub async fn count_other_active_for_site(
        pool: &PgPool,
        power_plant: &str,
        exclude_id: VisitId,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM visits \
             WHERE {SITE_ACTIVE_FILTER} AND id <> $4"
        );
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(power_plant)
            .bind(day_start)
            .bind(day_end)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
