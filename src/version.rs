//! RINEX revision description
use thiserror::Error;

/// Latest revision supported to this day
pub const SUPPORTED_VERSION: Version = Version { major: 4, minor: 0 };

/// Version describes the RINEX standard revision a file follows.
/// The major number decides the header field layout (2.x single line
/// fields, 3.x/4.x record markers) and the epoch record format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// Version major number
    pub major: u8,
    /// Version minor number
    pub minor: u8,
}

#[derive(Clone, Debug, Error)]
pub enum ParsingError {
    #[error("failed to parse version")]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl Default for Version {
    fn default() -> Self {
        SUPPORTED_VERSION
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((major, minor)) => Ok(Self {
                major: major.trim().parse::<u8>()?,
                minor: minor.trim().parse::<u8>()?,
            }),
            None => Ok(Self {
                major: s.trim().parse::<u8>()?,
                minor: 0,
            }),
        }
    }
}

impl Version {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
    /// Returns true if this revision is known to us
    pub fn is_supported(&self) -> bool {
        if self.major < SUPPORTED_VERSION.major {
            true
        } else if self.major == SUPPORTED_VERSION.major {
            self.minor <= SUPPORTED_VERSION.minor
        } else {
            false
        }
    }
    /// Modern revisions use the `> yyyy mm dd` epoch record format
    /// and 9 character site names.
    pub fn is_modern(&self) -> bool {
        self.major > 2
    }
}
