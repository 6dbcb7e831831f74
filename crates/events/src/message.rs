//! Subject and body composition for visit notifications.

use std::fmt::Write;

use turbinelog_db::models::visit::Visit;

/// Which transition a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitEvent {
    CheckedIn,
    CheckedOut,
}

impl VisitEvent {
    fn label(self) -> &'static str {
        match self {
            VisitEvent::CheckedIn => "Check-in",
            VisitEvent::CheckedOut => "Check-out",
        }
    }
}

const UNKNOWN_SITE: &str = "unknown site";

/// Subject line, e.g. `[Check-in] WTG-01 @ SiteA`.
pub fn subject(event: VisitEvent, visit: &Visit) -> String {
    format!(
        "[{}] {} @ {}",
        event.label(),
        visit.turbine_id,
        visit.power_plant.as_deref().unwrap_or(UNKNOWN_SITE)
    )
}

/// Plain-text body listing the visit's fields. Absent optional fields are
/// left out.
pub fn body(event: VisitEvent, visit: &Visit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} recorded.", event.label());
    let _ = writeln!(out);
    let _ = writeln!(out, "Turbine: {}", visit.turbine_id);
    let _ = writeln!(
        out,
        "Power plant: {}",
        visit.power_plant.as_deref().unwrap_or(UNKNOWN_SITE)
    );
    let _ = writeln!(out, "Technicians: {}", visit.technicians.join(", "));
    let _ = writeln!(out, "Status: {}", visit.status);

    let optional = [
        ("Reason", &visit.reason),
        ("Equipment", &visit.equipment_name),
        ("Maintenance company", &visit.maintenance_company),
        ("Malfunction type", &visit.malfunction_type),
        ("Comment", &visit.comment),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }

    let _ = writeln!(out, "Check-in: {}", visit.check_in.to_rfc3339());
    if let Some(check_out) = visit.check_out {
        let _ = writeln!(out, "Check-out: {}", check_out.to_rfc3339());
    }
    let _ = writeln!(out, "Visit id: {}", visit.id);
    out
}
