/*
 * File production infrastructure: standardized observation file names.
 *
 * Two naming conventions coexist:
 *   - short (pre RINEX3): 4 char site, day of year, session letter,
 *     2 digit year and a one letter file type;
 *   - long (RINEX3 and later): 9 char site, data source flag, full
 *     timestamp, file period, sampling rate and file type.
 *
 * The precision mode decides how much of the actual content timing
 * leaks into the produced name, independently of the convention.
 */
use hifitime::{Epoch, Unit};
use lazy_static::lazy_static;
use regex::Regex;

mod period;
pub use period::FilePeriod;

mod rate;
pub use rate::SampleRateCode;

use crate::compression::Compression;
use crate::constellation::Constellation;
use crate::epoch::{day_of_year, long_name_timestamp};
use crate::site::SiteId;

lazy_static! {
    static ref SHORT_NAME: Regex =
        Regex::new(r"^[0-9a-zA-Z]{4}[0-9]{3}(\d|\D)([0-9]{2}\.|\.)[0-9]{2}(o|d|O|D)(\.(Z|gz))?$")
            .unwrap();
    static ref LONG_NAME: Regex = Regex::new(
        r"^.{4}[0-9]{2}.{3}_(R|S|U)_[0-9]{11}_[0-9]{2}\w_[0-9]{2}\w_\w{2}\.\w{3}(\.gz)?$"
    )
    .unwrap();
}

/// Naming convention of an observation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameConvention {
    /// 4 char site + day of year + session/type suffix
    Short,
    /// 9 char site + source + timestamp + period + rate + type
    Long,
}

impl NameConvention {
    /// Recognize the convention an input file was named under.
    pub fn detect(filename: &str) -> Option<Self> {
        if SHORT_NAME.is_match(filename) {
            Some(Self::Short)
        } else if LONG_NAME.is_match(filename) {
            Some(Self::Long)
        } else {
            None
        }
    }
}

/// Data source flag of the long convention (`R` receiver, `S` stream,
/// `U` unknown). Recovered from a long input name, `R` per default.
pub fn data_source_from_name(filename: &str) -> char {
    if NameConvention::detect(filename) == Some(NameConvention::Long) {
        filename.chars().nth(10).unwrap_or('R')
    } else {
        'R'
    }
}

/// Governs how the file period and name timestamp are derived from
/// the content, independently of the naming convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrecisionMode {
    /// Conventional boundaries: start truncated to the hour (or day),
    /// period snapped to the IGS standard buckets.
    #[default]
    Basic,
    /// Start rounded down to the hour, period reflects the actual
    /// content duration (odd periods like 06H possible).
    Flex,
    /// Start is the literal first epoch, period reflects the actual
    /// content duration.
    Exact,
}

impl std::str::FromStr for PrecisionMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "flex" => Ok(Self::Flex),
            "exact" => Ok(Self::Exact),
            other => Err(format!("unknown filename style \"{}\"", other)),
        }
    }
}

/// Everything the composer needs to know about one file.
#[derive(Debug, Clone)]
pub struct NamingContext {
    pub site: SiteId,
    pub start: Epoch,
    pub end: Epoch,
    pub rate: SampleRateCode,
    pub constellation: Constellation,
    /// Hatanaka compressed payload (`crx`/`d` file types)
    pub hatanaka: bool,
    pub data_source: char,
}

impl NamingContext {
    /// File period and session flag under the given precision mode.
    pub fn file_period(&self, mode: PrecisionMode) -> (FilePeriod, bool) {
        let (period, session) = FilePeriod::from_span(self.start, self.end);
        match mode {
            PrecisionMode::Basic => period.snap_basic(session),
            PrecisionMode::Flex | PrecisionMode::Exact => (period, session),
        }
    }

    /// Long standardized filename, e.g.
    /// `ACOR00ESP_R_20213550000_01D_30S_MO.crx.gz`.
    pub fn long_name(&self, mode: PrecisionMode, compression: Compression) -> String {
        let (period, session) = self.file_period(mode);
        let (y, _, _, hh, mm, _, _) = self.start.to_gregorian_utc();
        let doy = day_of_year(self.start);

        let stamp = match period {
            FilePeriod::Daily if !session => format!("{:04}{:03}0000", y, doy),
            FilePeriod::Minutes(_) | FilePeriod::Unspecified => long_name_timestamp(self.start),
            FilePeriod::Hours(_) | FilePeriod::Daily => match mode {
                PrecisionMode::Basic | PrecisionMode::Flex => {
                    format!("{:04}{:03}{:02}00", y, doy, hh)
                },
                PrecisionMode::Exact => format!("{:04}{:03}{:02}{:02}", y, doy, hh, mm),
            },
        };

        let ext = if self.hatanaka { "crx" } else { "rnx" };

        format!(
            "{}_{}_{}_{}_{}_{}O.{}{}",
            self.site,
            self.data_source,
            stamp,
            period,
            self.rate,
            self.constellation,
            ext,
            compression.suffix(),
        )
    }

    /// Short legacy filename, e.g. `abcd3550.21o` or `abcd355s.21d.gz`.
    pub fn short_name(&self, mode: PrecisionMode, compression: Compression) -> String {
        let (period, _) = self.file_period(mode);
        let file_type = if self.hatanaka { 'd' } else { 'o' };
        let (y, _, _, hh, _, _, _) = self.start.to_gregorian_utc();
        let doy = day_of_year(self.start);
        let yy = (y % 100) as u8;
        let session_letter = (b'a' + hh) as char;

        let body = match period {
            FilePeriod::Hours(_) => format!("{:03}{}", doy, session_letter),
            FilePeriod::Minutes(_) => {
                // minute field rounded down to a 5' step
                let floored = self.start.floor(5 * Unit::Minute);
                let (_, _, _, _, mm, _, _) = floored.to_gregorian_utc();
                format!("{:03}{}{:02}", doy, session_letter, mm)
            },
            FilePeriod::Daily | FilePeriod::Unspecified => format!("{:03}0", doy),
        };

        format!(
            "{}{}.{:02}{}{}",
            self.site.four_char_lower(),
            body,
            yy,
            file_type,
            compression.suffix(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::Epoch;
    use std::str::FromStr;

    fn context(start: Epoch, end: Epoch) -> NamingContext {
        NamingContext {
            site: SiteId::from_str("ABCD00FRA").unwrap(),
            start,
            end,
            rate: SampleRateCode::Seconds(30),
            constellation: Constellation::Mixed,
            hatanaka: false,
            data_source: 'R',
        }
    }

    #[test]
    fn convention_detection() {
        for (name, expected) in [
            ("AJAC3550.21O", Some(NameConvention::Short)),
            ("rovn0010.21o", Some(NameConvention::Short)),
            ("VLNS0010.22D", Some(NameConvention::Short)),
            ("abcd355s.21d.gz", Some(NameConvention::Short)),
            (
                "ACOR00ESP_R_20213550000_01D_30S_MO.crx",
                Some(NameConvention::Long),
            ),
            (
                "MOJN00DNK_R_20201770000_01D_30S_MO.crx.gz",
                Some(NameConvention::Long),
            ),
            ("random.txt", None),
        ] {
            assert_eq!(NameConvention::detect(name), expected, "{}", name);
        }
    }

    #[test]
    fn data_source_recovery() {
        assert_eq!(
            data_source_from_name("KMS300DNK_S_20221591000_01H_30S_MO.crx"),
            'S'
        );
        assert_eq!(data_source_from_name("AJAC3550.21O"), 'R');
    }

    #[test]
    fn daily_file_both_conventions() {
        // full day, 30s sampling: 01D / 30S under basic
        let ctx = context(
            Epoch::from_gregorian_utc_at_midnight(2021, 12, 21),
            Epoch::from_gregorian_utc(2021, 12, 21, 23, 59, 30, 0),
        );
        assert_eq!(
            ctx.long_name(PrecisionMode::Basic, Compression::Gzip),
            "ABCD00FRA_R_20213550000_01D_30S_MO.rnx.gz"
        );
        assert_eq!(
            ctx.short_name(PrecisionMode::Basic, Compression::Plain),
            "abcd3550.21o"
        );
    }

    #[test]
    fn odd_session_by_precision_mode() {
        // 18:03 -> 23:59 session
        let ctx = context(
            Epoch::from_gregorian_utc(2021, 12, 21, 18, 3, 0, 0),
            Epoch::from_gregorian_utc(2021, 12, 21, 23, 59, 0, 0),
        );
        // basic: snapped to a daily file, day truncated start
        assert_eq!(
            ctx.long_name(PrecisionMode::Basic, Compression::Plain),
            "ABCD00FRA_R_20213550000_01D_30S_MO.rnx"
        );
        // flex: actual 06H period, hour floored start
        assert_eq!(
            ctx.long_name(PrecisionMode::Flex, Compression::Plain),
            "ABCD00FRA_R_20213551800_06H_30S_MO.rnx"
        );
        // exact: actual period, untouched minutes
        assert_eq!(
            ctx.long_name(PrecisionMode::Exact, Compression::Plain),
            "ABCD00FRA_R_20213551803_06H_30S_MO.rnx"
        );
    }

    #[test]
    fn hourly_short_name_session_letter() {
        let ctx = context(
            Epoch::from_gregorian_utc(2019, 3, 12, 16, 0, 0, 0),
            Epoch::from_gregorian_utc(2019, 3, 12, 16, 59, 30, 0),
        );
        // hour 16 -> letter 'q'
        assert_eq!(
            ctx.short_name(PrecisionMode::Basic, Compression::Plain),
            "abcd071q.19o"
        );
    }
}
