//! File period field: nominal duration covered by one file.
use hifitime::{Duration, Epoch, Unit};

/// Nominal file period, as expressed in standardized filenames.
/// `basic` naming snaps [FilePeriod::Hours] to the IGS conventional
/// buckets; `flex`/`exact` naming keeps the odd values (06H, 07H...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePeriod {
    /// `01D`: one file per day, the standard
    Daily,
    /// `xxH`: session of N full hours (01H being conventional)
    Hours(u8),
    /// `xxM`: sub hourly session (5, 10, 15, 20 or 30 minutes)
    Minutes(u8),
    /// `00U`: period not determined
    Unspecified,
}

impl FilePeriod {
    /// Derive the period from the actual content span.
    /// Also tells whether the file is a (sub)daily session.
    ///
    /// A tolerance of one hour absorbs old receivers that include the
    /// first epoch of the next hour or day, hence the double rounded
    /// deltas (maximal and averaged).
    pub fn from_span(start: Epoch, end: Epoch) -> (Self, bool) {
        let hour = 1 * Unit::Hour;
        let delta_max = end.ceil(hour) - start.floor(hour);
        let delta_ave = end.round(hour) - start.round(hour);

        let hours_ave = (delta_ave.to_seconds() / 3600.0) as i64;
        let delta_sec = (end - start).to_seconds();

        if delta_max <= (86400 - 3600) * Unit::Second && hours_ave > 0 {
            // N full hours (23 max)
            (Self::Hours(hours_ave as u8), true)
        } else if delta_max <= 1 * Unit::Hour {
            // sub hourly sessions, snapped to the conventional steps
            for m in [5u8, 10, 15, 20, 30] {
                let nominal = f64::from(m) * 60.0;
                if (nominal - 1.0) <= delta_sec && delta_sec <= (nominal + 1.0) {
                    return (Self::Minutes(m), true);
                }
            }
            (Self::Hours(1), true)
        } else if hours_ave == 0 && delta_max > 1 * Unit::Hour {
            // very short file riding in between two hours
            let hours_max = (delta_max.to_seconds() / 3600.0) as i64;
            (Self::Hours(hours_max as u8), true)
        } else if delta_max <= (86400 + 3600) * Unit::Second {
            (Self::Daily, false)
        } else {
            (Self::Unspecified, false)
        }
    }

    /// Snap to the conventional buckets: any multi hour session
    /// becomes a daily file. Sub hourly values are kept.
    pub fn snap_basic(self, session: bool) -> (Self, bool) {
        match self {
            Self::Hours(n) if n > 1 => (Self::Daily, false),
            other => (other, session),
        }
    }

    /// Nominal duration, when defined.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Daily => Some(1 * Unit::Day),
            Self::Hours(n) => Some(i64::from(*n) * Unit::Hour),
            Self::Minutes(m) => Some(i64::from(*m) * Unit::Minute),
            Self::Unspecified => None,
        }
    }
}

impl std::fmt::Display for FilePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "01D"),
            Self::Hours(n) => write!(f, "{:02}H", n),
            Self::Minutes(m) => write!(f, "{:02}M", m),
            Self::Unspecified => write!(f, "00U"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::Epoch;

    fn at(h: u8, m: u8, s: u8) -> Epoch {
        Epoch::from_gregorian_utc(2021, 12, 21, h, m, s, 0)
    }

    #[test]
    fn daily_span() {
        let (period, session) = FilePeriod::from_span(at(0, 0, 0), at(23, 59, 30));
        assert_eq!(period, FilePeriod::Daily);
        assert!(!session);
        assert_eq!(period.to_string(), "01D");
    }
    #[test]
    fn hourly_session() {
        let (period, session) = FilePeriod::from_span(at(9, 0, 0), at(9, 59, 30));
        assert_eq!(period, FilePeriod::Hours(1));
        assert!(session);
        assert_eq!(period.to_string(), "01H");
    }
    #[test]
    fn odd_six_hour_session() {
        let (period, session) = FilePeriod::from_span(at(18, 3, 0), at(23, 59, 0));
        assert_eq!(period, FilePeriod::Hours(6));
        assert!(session);
        assert_eq!(period.to_string(), "06H");
        // basic naming snaps it to the daily bucket
        let (snapped, session) = period.snap_basic(session);
        assert_eq!(snapped, FilePeriod::Daily);
        assert!(!session);
    }
    #[test]
    fn quarter_hour_session() {
        let (period, session) = FilePeriod::from_span(at(10, 0, 0), at(10, 14, 59));
        assert_eq!(period, FilePeriod::Minutes(15));
        assert!(session);
        assert_eq!(period.to_string(), "15M");
    }
    #[test]
    fn overlong_span_unspecified() {
        let start = Epoch::from_gregorian_utc_at_midnight(2021, 12, 21);
        let end = Epoch::from_gregorian_utc_at_midnight(2021, 12, 24);
        let (period, _) = FilePeriod::from_span(start, end);
        assert_eq!(period, FilePeriod::Unspecified);
    }
}
