//! Observation file model: full content buffer plus derived facts.
//!
//! The entire (decompressed) file is kept as an ordered line buffer:
//! mutations rewrite individual header lines at their fixed column
//! layout and leave everything else byte identical, Hatanaka
//! compressed bodies included.
use hifitime::{Duration, Epoch};

use crate::compression::Compression;
use crate::constellation::Constellation;
use crate::hardware::{AgencyInfo, Antenna, GroundPosition, Receiver};
use crate::production::{NameConvention, NamingContext, SampleRateCode};
use crate::site::SiteId;
use crate::version::Version;

mod parsing;

mod editing;

/// Timing facts derived from the epoch records themselves, not from
/// the header text (which may disagree or be missing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    /// First epoch found in the content
    pub start: Epoch,
    /// Last epoch found in the content
    pub end: Epoch,
    /// Dominant interval between consecutive epochs
    pub sample_interval: Duration,
    /// Interval expressed as a filename rate code
    pub rate: SampleRateCode,
}

/// One observation file being reworked.
#[derive(Debug)]
pub struct RinexFile {
    /// Full content, header and body, one entry per line.
    pub(crate) lines: Vec<String>,
    /// Format revision, immutable once parsed.
    pub version: Version,
    /// Station identification, from the file name (completed from
    /// metadata or catalog once resolved).
    pub site: SiteId,
    /// Convention the input file was named under, when recognized.
    pub name_convention: Option<NameConvention>,
    /// Outer compression of the input container.
    pub input_compression: Compression,
    /// Hatanaka compressed payload.
    pub hatanaka: bool,
    /// Data source flag (long convention), `R` per default.
    pub data_source: char,
    /// Content derived timing facts.
    pub span: TimeSpan,
    /// Current file name, compression suffix excluded.
    pub filename: String,
}

impl RinexFile {
    /// Render the content back to bytes. Lines untouched by any
    /// mutation are reproduced byte identical.
    pub fn serialize(&self) -> Vec<u8> {
        self.lines.join("\n").into_bytes()
    }

    /// Header portion only (up to and including `END OF HEADER`).
    pub fn header_lines(&self) -> &[String] {
        &self.lines[..=self.header_end_index().unwrap_or(self.lines.len() - 1)]
    }

    pub(crate) fn header_end_index(&self) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.contains("END OF HEADER"))
    }

    /// First header line carrying this label, search bounded by the
    /// end of the header section.
    pub(crate) fn find_label(&self, label: &str) -> Option<usize> {
        let end = self.header_end_index().unwrap_or(self.lines.len());
        self.lines[..=end.min(self.lines.len() - 1)]
            .iter()
            .position(|line| line.get(60..).map_or(false, |l| l.contains(label)))
    }

    fn label_content(&self, label: &str) -> Option<&str> {
        let idx = self.find_label(label)?;
        let line = &self.lines[idx];
        Some(line.get(..60).unwrap_or(line))
    }

    /// Receiver description from the `REC # / TYPE / VERS` line.
    pub fn receiver(&self) -> Option<Receiver> {
        self.label_content("REC # / TYPE / VERS")?.parse().ok()
    }

    /// Antenna description, eccentricities included when the
    /// `ANTENNA: DELTA H/E/N` line is present.
    pub fn antenna(&self) -> Option<Antenna> {
        let mut antenna: Antenna = self.label_content("ANT # / TYPE")?.parse().ok()?;
        if let Some(content) = self.label_content("ANTENNA: DELTA H/E/N") {
            let mut it = content.split_ascii_whitespace();
            antenna.height = it.next().and_then(|v| v.parse::<f64>().ok());
            antenna.eastern = it.next().and_then(|v| v.parse::<f64>().ok());
            antenna.northern = it.next().and_then(|v| v.parse::<f64>().ok());
        }
        Some(antenna)
    }

    /// Approximate geocentric position from the header.
    pub fn ground_position(&self) -> Option<GroundPosition> {
        GroundPosition::parse(self.label_content("APPROX POSITION XYZ")?)
    }

    /// Observer / agency pair.
    pub fn agency(&self) -> Option<AgencyInfo> {
        let content = self.label_content("OBSERVER / AGENCY")?;
        let content = format!("{:<60}", content);
        Some(AgencyInfo {
            operator: content[..20].trim().to_string(),
            agency: content[20..60].trim().to_string(),
        })
    }

    /// Satellite system letter of the `RINEX VERSION / TYPE` line.
    pub fn constellation(&self) -> Constellation {
        self.label_content("RINEX VERSION / TYPE")
            .and_then(|content| content.chars().nth(40))
            .and_then(|c| Constellation::from_code(c).ok())
            .unwrap_or_default()
    }

    /// `MARKER NAME` content, first token.
    pub fn marker_name(&self) -> Option<String> {
        let content = self.label_content("MARKER NAME")?;
        content.split_whitespace().next().map(|s| s.to_string())
    }

    /// Ordered free text comment lines of the header.
    pub fn comments(&self) -> Vec<&str> {
        let end = self.header_end_index().unwrap_or(self.lines.len());
        self.lines[..end]
            .iter()
            .filter(|line| line.get(60..).map_or(false, |l| l.contains("COMMENT")))
            .map(|line| line.get(..60).unwrap_or(line).trim_end())
            .collect()
    }

    /// Everything the filename composer needs.
    pub fn naming_context(&self) -> NamingContext {
        NamingContext {
            site: self.site.clone(),
            start: self.span.start,
            end: self.span.end,
            rate: self.span.rate,
            constellation: self.constellation(),
            hatanaka: self.hatanaka,
            data_source: self.data_source,
        }
    }
}

#[cfg(test)]
pub(crate) mod toolkit {
    /// Synthetic V3 observation file, 2021-12-21, 30s sampling.
    pub fn v3_content(site: &str, epochs: &[&str]) -> String {
        let mut lines = vec![
            format!("{:9}           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE", "3.04"),
            "sbf2rin-13.4.4                          20211222 000610 UTC PGM / RUN BY / DATE".to_string(),
            format!("{:<60}MARKER NAME", site),
            format!("{:<60}MARKER NUMBER", "10004M004"),
            format!("{:<20}{:<40}OBSERVER / AGENCY", "AUTOMATIC", "UNKNOWN"),
            format!("{:<20}{:<20}{:<20}REC # / TYPE / VERS", "3001355", "SEPT POLARX5", "5.3.2"),
            format!("{:<20}{:<20}{:<20}ANT # / TYPE", "CR620012101", "TRM59800.00     SCIS", ""),
            "  4696989.7040   723994.2090  4239678.3040                  APPROX POSITION XYZ".to_string(),
            "        0.0000        0.0000        0.0000                  ANTENNA: DELTA H/E/N".to_string(),
            "G    4 C1C L1C D1C S1C                                      SYS / # / OBS TYPES".to_string(),
            "    30.000                                                  INTERVAL".to_string(),
            "  2021    12    21     0     0    0.0000000     GPS         TIME OF FIRST OBS".to_string(),
            "                                                            END OF HEADER".to_string(),
        ];
        for (i, epoch) in epochs.iter().enumerate() {
            lines.push(format!("> {}  0 02", epoch));
            lines.push(format!(
                "G10  20836067.52{} 7 109492223.61{} 7      2052.58{}",
                i % 10,
                i % 10,
                i % 10
            ));
            lines.push("G13  23629347.915   123456789.012         -53.123".to_string());
        }
        lines.join("\n")
    }

    /// Regular epoch set at 30s, starting at midnight of the given
    /// `yyyy mm dd` date.
    pub fn epochs_30s(date: &str, count: usize) -> Vec<String> {
        let mut out = Vec::with_capacity(count);
        let mut secs = 0u32;
        for _ in 0..count {
            out.push(format!(
                "{} {:02} {:02} {:2}.0000000  0",
                date,
                secs / 3600,
                (secs / 60) % 60,
                secs % 60
            ));
            secs += 30;
        }
        out
    }
}
