//! Site identification: legacy 4 character and extended 9 character codes.
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("site code \"{0}\" is not 4 or 9 characters")]
    InvalidLength(String),
    #[error("failed to read 9-char site catalog: {0}")]
    CatalogIo(String),
}

/// Placeholder country segment when the country cannot be resolved.
pub const UNKNOWN_COUNTRY: &str = "XXX";

/// A GNSS station identifier. The extended form `SSSSMMCCC` carries the
/// legacy 4 character code, a 2 digit monument number and an ISO-3166
/// alpha-3 country segment. Files named under the short convention only
/// provide the 4 character code, in which case monument and country take
/// placeholder values until resolved from a metadata source or catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteId {
    code: String,     // 4 chars, uppercase
    monument: String, // 2 digits
    country: String,  // 3 chars, uppercase, "XXX" when unresolved
}

impl std::str::FromStr for SiteId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.len() {
            4 => Ok(Self {
                code: s.to_uppercase(),
                monument: "00".to_string(),
                country: UNKNOWN_COUNTRY.to_string(),
            }),
            9 => Ok(Self {
                code: s[..4].to_uppercase(),
                monument: s[4..6].to_string(),
                country: s[6..].to_uppercase(),
            }),
            _ => Err(Error::InvalidLength(s.to_string())),
        }
    }
}

impl std::fmt::Display for SiteId {
    /// Extended 9 character form, uppercase.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}{}", self.code, self.monument, self.country)
    }
}

impl SiteId {
    /// Legacy code, uppercase.
    pub fn four_char(&self) -> &str {
        &self.code
    }
    /// Legacy code, lowercase (short filename convention).
    pub fn four_char_lower(&self) -> String {
        self.code.to_lowercase()
    }
    /// Country segment ("XXX" when unresolved).
    pub fn country(&self) -> &str {
        &self.country
    }
    pub fn country_resolved(&self) -> bool {
        self.country != UNKNOWN_COUNTRY
    }
    /// Case insensitive comparison on the legacy code.
    pub fn matches(&self, other: &SiteId) -> bool {
        self.code == other.code
    }
    pub fn set_country(&mut self, country: &str) {
        self.country = country.to_uppercase();
    }
    pub fn set_monument(&mut self, monument: &str) {
        self.monument = monument.to_string();
    }
    /// Replace the legacy code, keeping monument/country segments
    /// unless the input carries them (9 characters).
    pub fn rename(&mut self, new: &SiteId) {
        self.code = new.code.clone();
        if new.country_resolved() {
            self.monument = new.monument.clone();
            self.country = new.country.clone();
        }
    }
}

/// 4 character to 9 character site catalog, loaded from a plain text
/// file with one extended code per line. Read-only after load, shared
/// across parallel file transforms.
#[derive(Debug, Clone, Default)]
pub struct NineCharCatalog {
    entries: HashMap<String, SiteId>,
}

impl NineCharCatalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let fd = std::fs::File::open(&path).map_err(|e| Error::CatalogIo(e.to_string()))?;
        let mut entries = HashMap::new();
        for line in BufReader::new(fd).lines() {
            let line = line.map_err(|e| Error::CatalogIo(e.to_string()))?;
            let trimmed = line.trim();
            if trimmed.len() < 9 {
                continue;
            }
            if let Ok(site) = trimmed[..9].parse::<SiteId>() {
                entries.insert(site.four_char().to_string(), site);
            }
        }
        Ok(Self { entries })
    }
    /// Extended identifier known for this legacy code, if any.
    pub fn lookup(&self, four_char: &str) -> Option<&SiteId> {
        self.entries.get(&four_char.to_uppercase())
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
