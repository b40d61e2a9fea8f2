//! Header mutation: apply a resolved instrumentation state and user
//! keyword overrides to one observation file, leaving an audit trail.
use std::collections::HashMap;
use std::str::FromStr;

use log::debug;
use strum_macros::{Display, EnumIter, EnumString};

use crate::constellation::Constellation;
use crate::epoch::{audit_timestamp, now};
use crate::error::{ConfigError, FileError};
use crate::meta::{Resolution, SourceKind};
use crate::rinex::RinexFile;

/// Header fields a user can override from the command line. The set
/// is closed: anything else is rejected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
pub enum Keyword {
    #[strum(serialize = "marker_name")]
    MarkerName,
    #[strum(serialize = "marker_number")]
    MarkerNumber,
    #[strum(serialize = "receiver_serial")]
    ReceiverSerial,
    #[strum(serialize = "receiver_type")]
    ReceiverType,
    #[strum(serialize = "receiver_fw")]
    ReceiverFw,
    #[strum(serialize = "antenna_serial")]
    AntennaSerial,
    #[strum(serialize = "antenna_type")]
    AntennaType,
    #[strum(serialize = "antenna_X_pos")]
    AntennaXPos,
    #[strum(serialize = "antenna_Y_pos")]
    AntennaYPos,
    #[strum(serialize = "antenna_Z_pos")]
    AntennaZPos,
    #[strum(serialize = "antenna_H_delta")]
    AntennaHDelta,
    #[strum(serialize = "antenna_E_delta")]
    AntennaEDelta,
    #[strum(serialize = "antenna_N_delta")]
    AntennaNDelta,
    #[strum(serialize = "operator")]
    Operator,
    #[strum(serialize = "agency")]
    Agency,
    #[strum(serialize = "sat_system")]
    SatSystem,
    #[strum(serialize = "interval")]
    Interval,
    #[strum(serialize = "filename_data_source")]
    FilenameDataSource,
    #[strum(serialize = "comment")]
    Comment,
}

/// User keyword overrides, applied on top of (and after) any resolved
/// metadata.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<Keyword, String>,
}

impl Overrides {
    /// Parse a `keyword:value` command line pair.
    pub fn push_pair(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| ConfigError::UnknownKeyword(pair.to_string()))?;
        let keyword = Keyword::from_str(key.trim())
            .map_err(|_| ConfigError::UnknownKeyword(key.to_string()))?;
        self.values.insert(keyword, value.trim().to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, keyword: Keyword) -> Option<&str> {
        self.values.get(&keyword).map(|v| v.as_str())
    }
}

/// Apply a resolution and/or overrides to one file header and stamp
/// the audit trail. Returns the non-fatal degradations encountered.
pub fn apply(
    rinex: &mut RinexFile,
    resolution: Option<&Resolution>,
    overrides: &Overrides,
    full_history: bool,
) -> Result<Vec<FileError>, FileError> {
    let mut warnings = Vec::new();

    if let Some(resolution) = resolution {
        apply_resolution(rinex, resolution, full_history);
        warnings.extend(resolution.warnings.iter().cloned());
    }
    apply_overrides(rinex, overrides)?;

    // align the timing lines with the content itself
    rinex.set_interval(rinex.span.sample_interval.to_seconds());
    rinex.set_time_obs();

    stamp_audit_trail(rinex, resolution, overrides);
    rinex.sort_header();

    debug!("{}: header mutated", rinex.filename);
    Ok(warnings)
}

fn apply_resolution(rinex: &mut RinexFile, resolution: &Resolution, full_history: bool) {
    let marker = if rinex.version.is_modern() {
        resolution.site.to_string()
    } else {
        resolution.site.four_char().to_string()
    };
    rinex.set_marker(&marker, resolution.domes.as_deref());
    // keep the full site identity even when the v2 marker only shows
    // the legacy code
    rinex.site.rename(&resolution.site);

    let receiver = &resolution.record.receiver;
    rinex.set_receiver(
        Some(&receiver.sn),
        Some(&receiver.model),
        Some(&receiver.firmware),
    );

    let antenna = &resolution.record.antenna;
    rinex.set_antenna(Some(&antenna.sn), Some(&antenna.model));
    rinex.set_antenna_delta(antenna.height, antenna.eastern, antenna.northern);

    if let Some(position) = resolution.record.position {
        rinex.set_position(Some(position.x), Some(position.y), Some(position.z));
    }

    if !resolution.agency.operator.is_empty() || !resolution.agency.agency.is_empty() {
        rinex.set_agencies(
            Some(&resolution.agency.operator).filter(|s| !s.is_empty()).map(|s| s.as_str()),
            Some(&resolution.agency.agency).filter(|s| !s.is_empty()).map(|s| s.as_str()),
        );
    }

    if resolution.forced_site {
        rinex.push_comment(&format!(
            "SITE FORCED TO {} FROM {}",
            resolution.site,
            resolution.source.to_uppercase()
        ));
    }
    if resolution.merged_from > 1 {
        rinex.push_comment(&format!(
            "{} FIRMWARE-ONLY PERIODS MERGED",
            resolution.merged_from
        ));
    }
    if full_history {
        for record in &resolution.history {
            let until = record
                .until
                .map(audit_timestamp)
                .unwrap_or_else(|| "open".to_string());
            rinex.push_comment(&format!(
                "{} / {} / {} -> {}",
                record.receiver.model,
                record.receiver.firmware,
                audit_timestamp(record.from),
                until,
            ));
        }
    }
}

fn apply_overrides(rinex: &mut RinexFile, overrides: &Overrides) -> Result<(), FileError> {
    use Keyword::*;

    if let Some(value) = overrides.get(MarkerName) {
        rinex.set_marker(value, None);
    }
    if let Some(value) = overrides.get(MarkerNumber) {
        rinex.set_marker_number(value);
    }
    if overrides.get(ReceiverSerial).is_some()
        || overrides.get(ReceiverType).is_some()
        || overrides.get(ReceiverFw).is_some()
    {
        rinex.set_receiver(
            overrides.get(ReceiverSerial),
            overrides.get(ReceiverType),
            overrides.get(ReceiverFw),
        );
    }
    if overrides.get(AntennaSerial).is_some() || overrides.get(AntennaType).is_some() {
        rinex.set_antenna(overrides.get(AntennaSerial), overrides.get(AntennaType));
    }

    let parse_float = |v: Option<&str>| v.and_then(|v| v.parse::<f64>().ok());
    let x = parse_float(overrides.get(AntennaXPos));
    let y = parse_float(overrides.get(AntennaYPos));
    let z = parse_float(overrides.get(AntennaZPos));
    if x.is_some() || y.is_some() || z.is_some() {
        rinex.set_position(x, y, z);
    }
    let h = parse_float(overrides.get(AntennaHDelta));
    let e = parse_float(overrides.get(AntennaEDelta));
    let n = parse_float(overrides.get(AntennaNDelta));
    if h.is_some() || e.is_some() || n.is_some() {
        rinex.set_antenna_delta(h, e, n);
    }

    if overrides.get(Operator).is_some() || overrides.get(Agency).is_some() {
        rinex.set_agencies(overrides.get(Operator), overrides.get(Agency));
    }
    if let Some(value) = overrides.get(SatSystem) {
        let constellation = Constellation::from_str(value)?;
        rinex.set_sat_system(constellation);
    }
    if let Some(value) = overrides.get(Interval) {
        if let Ok(seconds) = value.parse::<f64>() {
            rinex.set_interval(seconds);
        }
    }
    if let Some(value) = overrides.get(FilenameDataSource) {
        if let Some(flag) = value.chars().next().filter(|c| "RSU".contains(*c)) {
            rinex.data_source = flag;
        }
    }
    if let Some(value) = overrides.get(Comment) {
        rinex.push_comment(value);
    }
    Ok(())
}

/// Two comment lines per run: what touched the file and when, and
/// where the applied metadata came from.
fn stamp_audit_trail(rinex: &mut RinexFile, resolution: Option<&Resolution>, overrides: &Overrides) {
    rinex.push_comment(&format!("RINEXMOD ON {}", audit_timestamp(now())));
    let origin = match resolution {
        Some(resolution) => match resolution.kind {
            SourceKind::Sitelog => format!("METADATA FROM SITELOG {}", resolution.source),
            SourceKind::StationInfo => {
                format!("METADATA FROM STATION.INFO {}", resolution.source)
            },
        },
        None if !overrides.is_empty() => "METADATA FROM KEYWORD OVERRIDES".to_string(),
        None => "HEADER NORMALIZATION ONLY".to_string(),
    };
    rinex.push_comment(&origin.to_uppercase());
    rinex.set_pgm_run_by_date(
        concat!("rinexmod ", env!("CARGO_PKG_VERSION")),
        "RINEXMOD",
    );
}
