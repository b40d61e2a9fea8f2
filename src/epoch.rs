//! Epoch line recognition and timestamp helpers
use hifitime::{Epoch, Unit};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// V3/V4 epoch record: `> 2022  1  1  0  0  0.0000000  0 25`.
    /// CRINEX 3 bodies keep the same record format.
    static ref EPOCH_V3: Regex = Regex::new(
        r"^> (\d{4}) (\d{2}| \d) (\d{2}| \d) (\d{2}| \d) (\d{2}| \d) ((?: |\d)\d\.\d{4})"
    )
    .unwrap();
    /// V2 epoch record: ` 22  1  1  0  0  0.0000000  0 25`.
    /// CRINEX 1 bodies prefix the same record with `&`.
    static ref EPOCH_V2: Regex = Regex::new(
        r"^[ &](\d{2}) ((?: |\d)\d) ((?: |\d)\d) ((?: |\d)\d) ((?: |\d)\d) ((?: |\d)\d\.\d{4})"
    )
    .unwrap();
}

/*
 * Infallible `Epoch::now()` call.
 */
pub(crate) fn now() -> Epoch {
    Epoch::now().unwrap_or(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1))
}

/// Try to recognize an epoch record on this line. `modern` selects the
/// 3.x/4.x record format, otherwise the 2.x layout (2 digit year,
/// windowed at 1980).
pub(crate) fn parse_epoch_line(line: &str, modern: bool) -> Option<Epoch> {
    let re: &Regex = if modern { &EPOCH_V3 } else { &EPOCH_V2 };
    let caps = re.captures(line)?;
    let year = caps.get(1)?.as_str().trim().parse::<i32>().ok()?;
    let year = if modern {
        year
    } else if year >= 80 {
        year + 1900
    } else {
        year + 2000
    };
    let month = caps.get(2)?.as_str().trim().parse::<u8>().ok()?;
    let day = caps.get(3)?.as_str().trim().parse::<u8>().ok()?;
    let hour = caps.get(4)?.as_str().trim().parse::<u8>().ok()?;
    let minute = caps.get(5)?.as_str().trim().parse::<u8>().ok()?;
    let seconds = caps.get(6)?.as_str().trim().parse::<f64>().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        return None;
    }
    let second = seconds.floor();
    let nanos = ((seconds - second) * 1.0E9).round() as u32;
    Some(Epoch::from_gregorian_utc(
        year,
        month,
        day,
        hour,
        minute,
        second as u8,
        nanos,
    ))
}

/// Day of year of this epoch's date, 1 based.
pub(crate) fn day_of_year(e: Epoch) -> u16 {
    let (y, _, _, _, _, _, _) = e.to_gregorian_utc();
    let new_year = Epoch::from_gregorian_utc_at_midnight(y, 1, 1);
    ((e - new_year).to_unit(Unit::Day).floor() as u16) + 1
}

/// `yyyydddhhmm` timestamp segment of the long filename convention.
pub(crate) fn long_name_timestamp(e: Epoch) -> String {
    let (y, _, _, hh, mm, _, _) = e.to_gregorian_utc();
    format!("{:04}{:03}{:02}{:02}", y, day_of_year(e), hh, mm)
}

/// `yyyy-mm-dd hh:mm:ss` wall clock stamp used in audit comments.
pub(crate) fn audit_timestamp(e: Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = e.to_gregorian_utc();
    format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC", y, m, d, hh, mm, ss)
}

/// `yyyymmdd hhmmss` stamp of the `PGM / RUN BY / DATE` header line.
pub(crate) fn pgm_timestamp(e: Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = e.to_gregorian_utc();
    format!("{:04}{:02}{:02} {:02}{:02}{:02} UTC", y, m, d, hh, mm, ss)
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::Epoch;

    #[test]
    fn v3_epoch_recognition() {
        let line = "> 2022 01 01 00 00  0.0000000  0 25";
        let e = parse_epoch_line(line, true).unwrap();
        assert_eq!(e, Epoch::from_gregorian_utc_at_midnight(2022, 1, 1));

        let line = "> 2021 12 21 18 03 30.0000000  0 32";
        let e = parse_epoch_line(line, true).unwrap();
        assert_eq!(e, Epoch::from_gregorian_utc(2021, 12, 21, 18, 3, 30, 0));
    }
    #[test]
    fn v2_epoch_recognition() {
        let line = " 21 12 21  0  0  0.0000000  0 14G10G13G15G16G18G20G23G26G27";
        let e = parse_epoch_line(line, false).unwrap();
        assert_eq!(e, Epoch::from_gregorian_utc_at_midnight(2021, 12, 21));

        // CRINEX 1 epoch records carry a leading '&'
        let line = "&99  7  8  4 48 30.0000000  0 14";
        let e = parse_epoch_line(line, false).unwrap();
        assert_eq!(e, Epoch::from_gregorian_utc(1999, 7, 8, 4, 48, 30, 0));
    }
    #[test]
    fn data_lines_not_epochs() {
        for line in [
            "  23629347.915            .300 8         -.353  23629364.158",
            "     4375274.       11977.754 9",
            "  4696989.7040   723994.2090  4239678.3040                  APPROX POSITION XYZ",
        ] {
            assert!(parse_epoch_line(line, true).is_none());
        }
    }
    #[test]
    fn doy_computation() {
        let e = Epoch::from_gregorian_utc_at_midnight(2021, 12, 21);
        assert_eq!(day_of_year(e), 355);
        let e = Epoch::from_gregorian_utc_at_midnight(2015, 1, 1);
        assert_eq!(day_of_year(e), 1);
    }
    #[test]
    fn long_name_timestamps() {
        let e = Epoch::from_gregorian_utc(2021, 12, 21, 18, 3, 30, 0);
        assert_eq!(long_name_timestamp(e), "20213551803");
    }
}
