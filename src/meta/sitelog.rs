//! IGS site log parsing: instrumentation history, monument identity
//! and agency information.
use std::path::Path;

use hifitime::Epoch;
use lazy_static::lazy_static;
use regex::Regex;

use crate::hardware::{AgencyInfo, Antenna, GroundPosition, Receiver};
use crate::site::SiteId;

use super::{Error, InstrumentationRecord, SiteMeta, SourceKind};

lazy_static! {
    /// Numbered section header, `3.1`, `4.12`, `3.x` (template).
    static ref SECTION: Regex = Regex::new(r"^(\d{1,2})\.(\d{1,2}|x)?\s").unwrap();
    /// Tolerant date stamp: `2014-01-14T15:00Z`, `2014-01-14`.
    static ref DATE: Regex =
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2}))?").unwrap();
}

/// Parse a date stamp the way site logs write them (template
/// placeholders like `(CCYY-MM-DD)` yield `None`).
pub(crate) fn parse_date(value: &str) -> Option<Epoch> {
    let caps = DATE.captures(value)?;
    let y = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let m = caps.get(2)?.as_str().parse::<u8>().ok()?;
    let d = caps.get(3)?.as_str().parse::<u8>().ok()?;
    let hh = caps
        .get(4)
        .and_then(|c| c.as_str().parse::<u8>().ok())
        .unwrap_or(0);
    let mm = caps
        .get(5)
        .and_then(|c| c.as_str().parse::<u8>().ok())
        .unwrap_or(0);
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) || hh > 23 || mm > 59 {
        return None;
    }
    Some(Epoch::from_gregorian_utc(y, m, d, hh, mm, 0, 0))
}

#[derive(Default, Clone)]
struct ReceiverBlock {
    model: String,
    sn: String,
    firmware: String,
    installed: Option<Epoch>,
    removed: Option<Epoch>,
}

#[derive(Default, Clone)]
struct AntennaBlock {
    model: String,
    radome: String,
    sn: String,
    up: Option<f64>,
    north: Option<f64>,
    east: Option<f64>,
    installed: Option<Epoch>,
    removed: Option<Epoch>,
}

impl AntennaBlock {
    /// Header style antenna descriptor: 16 char model + radome.
    fn descriptor(&self) -> String {
        if self.model.len() > 16 || self.radome.is_empty() {
            self.model.clone()
        } else {
            format!("{:<16}{}", self.model, self.radome)
        }
    }
}

/// Read and parse one site log document.
pub fn parse_file(path: &Path) -> Result<SiteMeta, Error> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Unparsable(source.clone(), e.to_string()))?;
    parse(&content, &source)
}

/// Parse site log content. `source` identifies the document in audit
/// trails and diagnostics.
pub fn parse(content: &str, source: &str) -> Result<SiteMeta, Error> {
    let mut four_char = String::new();
    let mut nine_char = String::new();
    let mut domes = None;
    let mut prepared = None;
    let mut x = None;
    let mut y = None;
    let mut z = None;
    let mut onsite_abbrev = String::new();
    let mut responsible_abbrev = String::new();

    let mut receivers: Vec<ReceiverBlock> = Vec::new();
    let mut antennas: Vec<AntennaBlock> = Vec::new();

    // (major, minor) of the section being read, `None` minor for the
    // unnumbered ones; templates (`3.x`) are skipped entirely
    let mut section: (u8, Option<String>) = (0, None);
    let mut template = false;

    for line in content.lines() {
        if let Some(caps) = SECTION.captures(line) {
            let major = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u8>().ok())
                .unwrap_or(0);
            let minor = caps.get(2).map(|m| m.as_str().to_string());
            template = minor.as_deref() == Some("x");
            let new_block = section != (major, minor.clone());
            section = (major, minor);
            if new_block && !template {
                match section.0 {
                    3 => receivers.push(ReceiverBlock::default()),
                    4 => antennas.push(AntennaBlock::default()),
                    _ => {},
                }
            }
        }
        if template {
            continue;
        }

        let (key, value) = match split_field(line) {
            Some(pair) => pair,
            None => continue,
        };

        match section.0 {
            0 => {
                if key.starts_with("Date Prepared") {
                    prepared = parse_date(value);
                }
            },
            1 => {
                if key.starts_with("Four Character ID") {
                    four_char = value.to_string();
                } else if key.starts_with("Nine Character ID") {
                    nine_char = value.to_string();
                } else if key.starts_with("IERS DOMES Number") && !value.is_empty() {
                    domes = Some(value.to_string());
                }
            },
            2 => {
                if key.starts_with("X coordinate") {
                    x = value.parse::<f64>().ok();
                } else if key.starts_with("Y coordinate") {
                    y = value.parse::<f64>().ok();
                } else if key.starts_with("Z coordinate") {
                    z = value.parse::<f64>().ok();
                }
            },
            3 => {
                if let Some(block) = receivers.last_mut() {
                    if key.starts_with("Receiver Type") {
                        block.model = value.to_string();
                    } else if key.starts_with("Serial Number") {
                        block.sn = value.to_string();
                    } else if key.starts_with("Firmware Version") {
                        block.firmware = value.to_string();
                    } else if key.starts_with("Date Installed") {
                        block.installed = parse_date(value);
                    } else if key.starts_with("Date Removed") {
                        block.removed = parse_date(value);
                    }
                }
            },
            4 => {
                if let Some(block) = antennas.last_mut() {
                    if key.starts_with("Antenna Type") {
                        block.model = value.to_string();
                    } else if key.starts_with("Antenna Radome Type") {
                        block.radome = value.to_string();
                    } else if key.starts_with("Serial Number") {
                        block.sn = value.to_string();
                    } else if key.starts_with("Marker->ARP Up") {
                        block.up = value.parse::<f64>().ok();
                    } else if key.starts_with("Marker->ARP North") {
                        block.north = value.parse::<f64>().ok();
                    } else if key.starts_with("Marker->ARP East") {
                        block.east = value.parse::<f64>().ok();
                    } else if key.starts_with("Date Installed") {
                        block.installed = parse_date(value);
                    } else if key.starts_with("Date Removed") {
                        block.removed = parse_date(value);
                    }
                }
            },
            11 => {
                if key.starts_with("Preferred Abbreviation") && onsite_abbrev.is_empty() {
                    onsite_abbrev = value.to_string();
                }
            },
            12 => {
                if key.starts_with("Preferred Abbreviation") && responsible_abbrev.is_empty() {
                    responsible_abbrev = value.to_string();
                }
            },
            _ => {},
        }
    }

    let site: SiteId = if nine_char.len() == 9 {
        nine_char.parse()
    } else {
        four_char.parse()
    }
    .map_err(|e: crate::site::Error| Error::Unparsable(source.to_string(), e.to_string()))?;

    let position = match (x, y, z) {
        (Some(x), Some(y), Some(z)) => Some(GroundPosition::new(x, y, z)),
        _ => None,
    };

    let records = build_records(&receivers, &antennas, position);
    if records.is_empty() {
        return Err(Error::Unparsable(
            source.to_string(),
            "no instrumentation period".to_string(),
        ));
    }

    let agency = AgencyInfo {
        operator: onsite_abbrev.clone(),
        agency: if responsible_abbrev.is_empty() {
            onsite_abbrev
        } else {
            responsible_abbrev
        },
    };

    Ok(SiteMeta {
        site,
        records,
        prepared: prepared.unwrap_or(Epoch::from_gregorian_utc_at_midnight(1980, 1, 6)),
        agency,
        domes,
        source: source.to_string(),
        kind: SourceKind::Sitelog,
    })
}

/// `Key                       : value` pair of an indented content
/// line. Template placeholders `(...)` count as empty values.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(" : ")?;
    let key = key.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == 'x');
    let value = value.trim();
    if value.starts_with('(') {
        Some((key.trim(), ""))
    } else {
        Some((key.trim(), value))
    }
}

/// Fold receiver and antenna blocks into instrumentation periods: one
/// record per window during which both a receiver and an antenna were
/// installed, boundaries taken from every install/removal date.
fn build_records(
    receivers: &[ReceiverBlock],
    antennas: &[AntennaBlock],
    position: Option<GroundPosition>,
) -> Vec<InstrumentationRecord> {
    let mut bounds: Vec<Epoch> = receivers
        .iter()
        .flat_map(|r| [r.installed, r.removed])
        .chain(antennas.iter().flat_map(|a| [a.installed, a.removed]))
        .flatten()
        .collect();
    bounds.sort();
    bounds.dedup();

    let mut records: Vec<InstrumentationRecord> = Vec::new();
    for (i, &from) in bounds.iter().enumerate() {
        let until = bounds.get(i + 1).copied();

        let receiver = receivers
            .iter()
            .find(|r| r.installed.map_or(false, |t| t <= from) && r.removed.map_or(true, |t| from < t));
        let antenna = antennas
            .iter()
            .find(|a| a.installed.map_or(false, |t| t <= from) && a.removed.map_or(true, |t| from < t));

        let (receiver, antenna) = match (receiver, antenna) {
            (Some(r), Some(a)) => (r, a),
            _ => continue,
        };

        let record = InstrumentationRecord {
            from,
            until,
            receiver: Receiver {
                sn: receiver.sn.clone(),
                model: receiver.model.clone(),
                firmware: receiver.firmware.clone(),
            },
            antenna: Antenna {
                model: antenna.descriptor(),
                sn: antenna.sn.clone(),
                height: antenna.up,
                eastern: antenna.east,
                northern: antenna.north,
            },
            position,
        };

        // coalesce windows bounded by a date that changed nothing
        match records.last_mut() {
            Some(last)
                if last.until == Some(record.from)
                    && last.receiver == record.receiver
                    && last.antenna == record.antenna =>
            {
                last.until = record.until;
            },
            _ => records.push(record),
        }
    }
    records
}
