//! GAMIT metadata: station.info instrumentation tables and their
//! companion position catalog (apr / L-file).
use std::collections::HashMap;
use std::path::Path;

use hifitime::{Epoch, Unit};
use log::warn;

use crate::hardware::{AgencyInfo, Antenna, GroundPosition, Receiver};
use crate::site::SiteId;

use super::{Error, InstrumentationRecord, SiteMeta, SourceKind};

/// Column layout of a station.info table, derived from its `*SITE`
/// header line. Values are sliced between consecutive label starts.
struct Columns {
    starts: Vec<(usize, String)>,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        let labels = [
            "SITE",
            "Station Name",
            "Session Start",
            "Session Stop",
            "Ant Ht",
            "HtCod",
            "Ant N",
            "Ant E",
            "Receiver Type",
            "Vers",
            "SwVer",
            "Receiver SN",
            "Antenna Type",
            "Dome",
            "Antenna SN",
        ];
        let mut starts: Vec<(usize, String)> = labels
            .iter()
            .filter_map(|label| header.find(label).map(|at| (at, label.to_string())))
            .collect();
        if starts.len() < 8 {
            return None;
        }
        starts.sort();
        Some(Self { starts })
    }

    fn field<'a>(&self, line: &'a str, label: &str) -> Option<&'a str> {
        let pos = self.starts.iter().position(|(_, l)| l == label)?;
        let from = self.starts[pos].0;
        let until = self
            .starts
            .get(pos + 1)
            .map(|(at, _)| *at)
            .unwrap_or(line.len());
        Some(line.get(from..until.min(line.len()))?.trim())
    }
}

/// `yyyy doy hh mm ss` session stamp. The `9999 999 ...` sentinel
/// (still running session) yields `None`.
fn parse_session_stamp(value: &str) -> Option<Epoch> {
    let mut it = value.split_ascii_whitespace();
    let year = it.next()?.parse::<i32>().ok()?;
    let doy = it.next()?.parse::<u16>().ok()?;
    if year == 9999 || doy == 999 || doy == 0 {
        return None;
    }
    let hh = it.next().and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    let mm = it.next().and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    let ss = it.next().and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    let midnight = Epoch::from_gregorian_utc_at_midnight(year, 1, 1);
    Some(
        midnight
            + i64::from(doy - 1) * Unit::Day
            + hh * Unit::Hour
            + mm * Unit::Minute
            + ss * Unit::Second,
    )
}

/// Parse an apr / L-file position catalog: one `SITE_GPS X Y Z` line
/// per site.
fn parse_positions(content: &str) -> HashMap<String, GroundPosition> {
    let mut positions = HashMap::new();
    for line in content.lines() {
        let mut it = line.split_ascii_whitespace();
        let tag = match it.next() {
            Some(tag) if tag.len() >= 4 && !tag.starts_with('*') => tag,
            _ => continue,
        };
        let site = tag.split('_').next().unwrap_or(tag).to_uppercase();
        if site.len() != 4 {
            continue;
        }
        let (x, y, z) = match (it.next(), it.next(), it.next()) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => continue,
        };
        if let (Ok(x), Ok(y), Ok(z)) = (x.parse(), y.parse(), z.parse()) {
            positions.insert(site, GroundPosition::new(x, y, z));
        }
    }
    positions
}

/// Parse a station.info table and its position catalog into one
/// metadata source per site found in the table.
pub fn parse_pair(station_info: &Path, lfile: &Path) -> Result<Vec<SiteMeta>, Error> {
    let info_name = station_info
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| station_info.display().to_string());
    let info_content = std::fs::read_to_string(station_info)
        .map_err(|_| Error::MissingSource(station_info.display().to_string()))?;
    let lfile_content = std::fs::read_to_string(lfile)
        .map_err(|_| Error::MissingSource(lfile.display().to_string()))?;
    parse(&info_content, &lfile_content, &info_name)
}

/// Parse station.info and position catalog content.
pub fn parse(
    info_content: &str,
    lfile_content: &str,
    source: &str,
) -> Result<Vec<SiteMeta>, Error> {
    let positions = parse_positions(lfile_content);

    let columns = info_content
        .lines()
        .find(|line| line.starts_with("*SITE"))
        .and_then(Columns::from_header)
        .ok_or_else(|| {
            Error::Unparsable(source.to_string(), "no *SITE header line".to_string())
        })?;

    // records per site, table order preserved
    let mut per_site: HashMap<String, Vec<InstrumentationRecord>> = HashMap::new();
    for line in info_content.lines() {
        if line.starts_with('*') || line.trim().is_empty() {
            continue;
        }
        let site = match columns.field(line, "SITE") {
            Some(site) if site.len() == 4 => site.to_uppercase(),
            _ => continue,
        };
        let from = match columns
            .field(line, "Session Start")
            .and_then(parse_session_stamp)
        {
            Some(from) => from,
            None => {
                warn!("{}: unreadable session start for {}", source, site);
                continue;
            },
        };
        let until = columns
            .field(line, "Session Stop")
            .and_then(parse_session_stamp);

        let antenna_model = format!(
            "{:<16}{}",
            columns.field(line, "Antenna Type").unwrap_or(""),
            columns.field(line, "Dome").unwrap_or(""),
        );
        let record = InstrumentationRecord {
            from,
            until,
            receiver: Receiver {
                sn: columns.field(line, "Receiver SN").unwrap_or("").to_string(),
                model: columns
                    .field(line, "Receiver Type")
                    .unwrap_or("")
                    .to_string(),
                firmware: columns.field(line, "Vers").unwrap_or("").to_string(),
            },
            antenna: Antenna {
                model: antenna_model.trim_end().to_string(),
                sn: columns.field(line, "Antenna SN").unwrap_or("").to_string(),
                height: columns
                    .field(line, "Ant Ht")
                    .and_then(|v| v.parse::<f64>().ok()),
                eastern: columns
                    .field(line, "Ant E")
                    .and_then(|v| v.parse::<f64>().ok()),
                northern: columns
                    .field(line, "Ant N")
                    .and_then(|v| v.parse::<f64>().ok()),
            },
            position: positions.get(&site).copied(),
        };
        per_site.entry(site).or_default().push(record);
    }

    let mut sources: Vec<SiteMeta> = per_site
        .into_iter()
        .filter_map(|(site, mut records)| {
            let site: SiteId = site.parse().ok()?;
            records.sort_by_key(|r| r.from);
            Some(SiteMeta {
                site,
                records,
                prepared: Epoch::from_gregorian_utc_at_midnight(1980, 1, 6),
                agency: AgencyInfo::default(),
                domes: None,
                source: source.to_string(),
                kind: SourceKind::StationInfo,
            })
        })
        .collect();
    sources.sort_by(|a, b| a.site.four_char().cmp(b.site.four_char()));
    Ok(sources)
}

#[cfg(test)]
mod test {
    use super::*;

    const STATION_INFO: &str = "\
* Generated by gamit utilities
*SITE  Station Name      Session Start      Session Stop       Ant Ht   HtCod  Ant N    Ant E    Receiver Type         Vers                  SwVer  Receiver SN           Antenna Type     Dome   Antenna SN
 ABMF  Aeroport Raizet   2008 283 00 00 00  2012 132 08 00 00   0.0000  DHARP   0.0000   0.0000  TRIMBLE NETR5         4.03                  48.30  4917K61764            TRM55971.00      NONE   1440911917
 ABMF  Aeroport Raizet   2012 132 08 00 00  9999 999 00 00 00   0.0000  DHARP   0.0000   0.0000  TRIMBLE NETR9         4.48                  48.30  5035K69716            TRM55971.00      NONE   1440911917
 TLSE  Toulouse          2019 001 00 00 00  9999 999 00 00 00   1.0530  DHARP   0.0000   0.0000  SEPT POLARX5          5.3.2                 48.30  3001355               TRM59800.00      SCIS   725063
";

    const LFILE: &str = "\
 ABMF_GPS  2919785.71277 -5383745.04605  1774604.71800  0.0 0.0 0.0 2010.0
 TLSE_GPS  4627851.90610   119640.02180  4372993.52230  0.0 0.0 0.0 2010.0
";

    #[test]
    fn table_parsing() {
        let sources = parse(STATION_INFO, LFILE, "station.info.ovsg").unwrap();
        assert_eq!(sources.len(), 2);

        let abmf = &sources[0];
        assert_eq!(abmf.site.four_char(), "ABMF");
        assert_eq!(abmf.kind, SourceKind::StationInfo);
        assert_eq!(abmf.records.len(), 2);

        let first = &abmf.records[0];
        assert_eq!(first.receiver.model, "TRIMBLE NETR5");
        assert_eq!(first.receiver.firmware, "4.03");
        assert_eq!(first.antenna.model, "TRM55971.00     NONE");
        assert_eq!(first.antenna.sn, "1440911917");
        assert_eq!(
            first.from,
            Epoch::from_gregorian_utc_at_midnight(2008, 10, 9)
        );
        assert_eq!(
            first.until,
            Some(Epoch::from_gregorian_utc(2012, 5, 11, 8, 0, 0, 0))
        );
        // still running session
        assert_eq!(abmf.records[1].until, None);
        assert_eq!(first.position.unwrap().y, -5383745.04605);
    }

    #[test]
    fn session_stamps() {
        assert_eq!(
            parse_session_stamp("2008 283 00 00 00"),
            Some(Epoch::from_gregorian_utc_at_midnight(2008, 10, 9))
        );
        assert_eq!(
            parse_session_stamp("2019 001 12 30 00"),
            Some(Epoch::from_gregorian_utc(2019, 1, 1, 12, 30, 0, 0))
        );
        assert_eq!(parse_session_stamp("9999 999 00 00 00"), None);
        assert_eq!(parse_session_stamp("garbage"), None);
    }

    #[test]
    fn position_catalog() {
        let positions = parse_positions(LFILE);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions["TLSE"].x, 4627851.9061);
    }

    #[test]
    fn missing_header_rejected() {
        assert!(parse("no header here", LFILE, "broken").is_err());
    }
}
