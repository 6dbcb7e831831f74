//! Technician list normalization.
//!
//! Check-in payloads carry technicians either as a JSON array of display
//! strings or as a single comma-separated string. Both shapes collapse to
//! the same ordered, deduplicated list of trimmed, non-empty entries.

use serde::Deserialize;

use crate::error::CoreError;

/// Message returned when a check-in carries no usable technician name.
pub const TECHNICIANS_REQUIRED: &str = "at least one technician name is required";

/// Raw technician field as accepted on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TechnicianInput {
    List(Vec<String>),
    Text(String),
}

impl TechnicianInput {
    /// Normalize into trimmed, non-empty names, keeping the first occurrence
    /// of each duplicate.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TechnicianInput::List(items) => dedup_trimmed(items.iter().map(String::as_str)),
            TechnicianInput::Text(text) => dedup_trimmed(text.split(',')),
        }
    }
}

fn dedup_trimmed<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let name = item.trim();
        if name.is_empty() || out.iter().any(|existing| existing == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

/// Normalize an optional technician field and require at least one entry.
pub fn require_technicians(input: Option<&TechnicianInput>) -> Result<Vec<String>, CoreError> {
    let names = input.map(TechnicianInput::normalize).unwrap_or_default();
    if names.is_empty() {
        return Err(CoreError::Validation(TECHNICIANS_REQUIRED.to_string()));
    }
    Ok(names)
}
