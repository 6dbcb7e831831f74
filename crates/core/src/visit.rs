//! Visit status flag and field normalization rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::VisitId;

/// Entity name used in not-found errors.
pub const VISIT_ENTITY: &str = "Visit";

/// Prefix of the turbine id stored when a check-in does not name one.
pub const UNSPECIFIED_TURBINE_PREFIX: &str = "UNSPECIFIED-";

/// Advisory presence flag carried on each visit.
///
/// Activity is decided by `check_out IS NULL` alone. The flag only takes
/// part in the co-activity filter, where just `In` visits are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum VisitStatus {
    #[default]
    In,
    Out,
}

impl VisitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitStatus::In => "IN",
            VisitStatus::Out => "OUT",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(VisitStatus::In),
            "OUT" => Ok(VisitStatus::Out),
            other => Err(CoreError::Validation(format!(
                "status must be IN or OUT, got '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for VisitStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Synthesize the turbine id stored when the caller leaves it blank.
pub fn placeholder_turbine_id(id: VisitId) -> String {
    let hex = id.simple().to_string();
    format!("{UNSPECIFIED_TURBINE_PREFIX}{}", &hex[..8])
}

/// Trim optional free text, mapping blank values to `None`.
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
