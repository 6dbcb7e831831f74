//! Routing of notifications to recipient addresses by power plant.
//!
//! The directory is parsed from a single configuration string of the form
//! `SiteA=a@x.com,b@x.com;SiteB=c@x.com;OTHER=ops@x.com`. Site names match
//! case-insensitively; anything unmatched (or a visit without a power plant)
//! routes to the `OTHER` entry.

use std::collections::HashMap;

/// Key of the catch-all entry.
pub const FALLBACK_KEY: &str = "OTHER";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecipientParseError {
    #[error("recipient entry '{0}' must look like SITE=addr1,addr2")]
    MalformedEntry(String),

    #[error("recipient entry '{0}' lists no addresses")]
    NoAddresses(String),
}

/// Power plant to recipient address mapping with an `OTHER` fallback.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    routes: HashMap<String, Vec<String>>,
    fallback: Vec<String>,
}

impl RecipientDirectory {
    /// Parse the `NOTIFY_RECIPIENTS` format. An empty string yields an empty
    /// directory, which disables notifications.
    pub fn parse(raw: &str) -> Result<Self, RecipientParseError> {
        let mut directory = Self::default();

        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (site, addresses) = entry
                .split_once('=')
                .ok_or_else(|| RecipientParseError::MalformedEntry(entry.to_string()))?;

            let site = site.trim();
            if site.is_empty() {
                return Err(RecipientParseError::MalformedEntry(entry.to_string()));
            }

            let addresses: Vec<String> = addresses
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            if addresses.is_empty() {
                return Err(RecipientParseError::NoAddresses(entry.to_string()));
            }

            if site.eq_ignore_ascii_case(FALLBACK_KEY) {
                directory.fallback = addresses;
            } else {
                directory.routes.insert(site.to_lowercase(), addresses);
            }
        }

        Ok(directory)
    }

    /// Recipients for a power plant, falling back to `OTHER`.
    pub fn resolve(&self, power_plant: Option<&str>) -> &[String] {
        power_plant
            .map(|p| p.trim().to_lowercase())
            .and_then(|key| self.routes.get(&key))
            .unwrap_or(&self.fallback)
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.fallback.is_empty()
    }
}
