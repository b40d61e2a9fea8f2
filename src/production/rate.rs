//! Sample rate field of the long filename convention.
use hifitime::Duration;

/// Observation sampling rate, encoded the way long standardized
/// filenames express it (`30S`, `01H`, `100C`...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRateCode {
    /// `00U`: rate not determined
    Unspecified,
    /// `xxC`: hundreds of Hertz
    CentiHertz(u32),
    /// `xxZ`: Hertz
    Hertz(u32),
    /// `xxS`: seconds
    Seconds(u32),
    /// `xxM`: minutes
    Minutes(u32),
    /// `xxH`: hours
    Hours(u32),
    /// `xxD`: days
    Days(u32),
}

impl SampleRateCode {
    /// Bucket a measured sampling interval. Values are rounded to
    /// absorb leap second related jitter.
    pub fn from_interval(dt: Duration) -> Self {
        let secs = dt.to_seconds();
        if secs <= 0.0001 {
            Self::Unspecified
        } else if secs <= 0.01 {
            Self::CentiHertz((1.0 / (100.0 * secs)).round() as u32)
        } else if secs < 1.0 {
            Self::Hertz((1.0 / secs).round() as u32)
        } else if secs < 60.0 {
            Self::Seconds(secs.round() as u32)
        } else if secs < 3600.0 {
            Self::Minutes((secs / 60.0).round() as u32)
        } else if secs < 86400.0 {
            Self::Hours((secs / 3600.0).round() as u32)
        } else if secs <= 8_553_600.0 {
            Self::Days((secs / 86400.0).round() as u32)
        } else {
            Self::Unspecified
        }
    }
}

impl std::fmt::Display for SampleRateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Unspecified => write!(f, "00U"),
            Self::CentiHertz(v) => write!(f, "{:02}C", v),
            Self::Hertz(v) => write!(f, "{:02}Z", v),
            Self::Seconds(v) => write!(f, "{:02}S", v),
            Self::Minutes(v) => write!(f, "{:02}M", v),
            Self::Hours(v) => write!(f, "{:02}H", v),
            Self::Days(v) => write!(f, "{:02}D", v),
        }
    }
}
