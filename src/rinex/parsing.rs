//! Observation file recognition: format checks, identification and
//! epoch scanning.
use std::path::Path;

use hifitime::{Duration, Epoch};
use itertools::Itertools;
use log::{debug, warn};

use crate::compression::{decompress, Compression};
use crate::epoch::parse_epoch_line;
use crate::error::FileError;
use crate::production::{data_source_from_name, NameConvention, SampleRateCode};
use crate::site::SiteId;
use crate::version::Version;

use super::{RinexFile, TimeSpan};

/// Above this share of off-nominal epoch intervals, the sampling rate
/// is reported as undetermined rather than guessed.
const NON_NOMINAL_TOLERANCE: f64 = 0.45;

impl RinexFile {
    /// Read, uncompress and parse one observation file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FileError::MissingInputFile);
        }
        let bytes = std::fs::read(path).map_err(|_| FileError::MissingInputFile)?;
        let (content, compression) = decompress(&bytes)?;
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or(FileError::MissingInputFile)?;
        Self::parse(&content, &basename, compression)
    }

    /// Parse readable content. `basename` is the input file name,
    /// compression suffix included, used to recover the site and the
    /// data source flag when the name follows a convention.
    pub fn parse(
        content: &[u8],
        basename: &str,
        input_compression: Compression,
    ) -> Result<Self, FileError> {
        let text = String::from_utf8_lossy(content);
        let lines: Vec<String> = text
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        if lines.is_empty() || lines[0].trim().is_empty() {
            return Err(FileError::NotObservationFile);
        }

        let hatanaka = lines[0].contains("COMPACT RINEX FORMAT");

        // locate the (inner, for Hatanaka) format declaration
        let version_line = lines
            .iter()
            .take(8)
            .find(|l| l.get(60..).map_or(false, |c| c.contains("RINEX VERSION / TYPE")))
            .ok_or(FileError::NotObservationFile)?;

        if version_line.chars().nth(20) != Some('O') {
            return Err(FileError::NotObservationFile);
        }

        let version: Version = version_line
            .get(..9)
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|_| FileError::NotObservationFile)?;

        let name_convention = NameConvention::detect(basename);
        let data_source = data_source_from_name(basename);

        let filename = basename
            .trim_end_matches(".gz")
            .trim_end_matches(".Z")
            .to_string();

        let site = match name_convention {
            Some(NameConvention::Long) => filename.get(..9).and_then(|s| s.parse::<SiteId>().ok()),
            Some(NameConvention::Short) => filename.get(..4).and_then(|s| s.parse::<SiteId>().ok()),
            None => None,
        }
        .or_else(|| {
            // fall back on the marker name
            lines
                .iter()
                .find(|l| l.get(60..).map_or(false, |c| c.contains("MARKER NAME")))
                .and_then(|l| l.get(..60).unwrap_or(l).split_whitespace().next())
                .filter(|name| name.len() >= 4)
                .and_then(|name| name[..4].parse::<SiteId>().ok())
        })
        .unwrap_or_else(|| "XXXX".parse::<SiteId>().unwrap());

        let span = Self::scan_epochs(&lines, version.is_modern())?;

        debug!(
            "{}: v{} {} [{} - {}] {}",
            filename,
            version,
            if hatanaka { "crinex" } else { "rinex" },
            span.start,
            span.end,
            span.rate,
        );

        Ok(Self {
            lines,
            version,
            site,
            name_convention,
            input_compression,
            hatanaka,
            data_source,
            span,
            filename,
        })
    }

    /// Walk the data section and derive the actual time frame and
    /// dominant sampling interval.
    fn scan_epochs(lines: &[String], modern: bool) -> Result<TimeSpan, FileError> {
        let body_start = lines
            .iter()
            .position(|l| l.contains("END OF HEADER"))
            .map(|i| i + 1)
            .unwrap_or(0);

        let epochs: Vec<Epoch> = lines[body_start..]
            .iter()
            .filter_map(|l| parse_epoch_line(l, modern))
            .collect();

        if epochs.len() < 2 {
            return Err(FileError::InsufficientEpochs);
        }

        let start = epochs.iter().min().copied().unwrap_or(epochs[0]);
        let end = epochs.iter().max().copied().unwrap_or(epochs[0]);

        // dominant interval by simple vote, zero gaps excluded
        let histogram = epochs
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).total_nanoseconds())
            .filter(|dt| *dt > 0)
            .counts();
        if histogram.is_empty() {
            return Err(FileError::InsufficientEpochs);
        }

        let total: usize = histogram.values().sum();
        let (dominant_ns, dominant_count) = histogram
            .iter()
            .map(|(ns, count)| (*ns, *count))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .unwrap_or((0, 0));

        let sample_interval = Duration::from_total_nanoseconds(dominant_ns);
        let non_nominal = 1.0 - (dominant_count as f64 / total as f64);

        let rate = if non_nominal > NON_NOMINAL_TOLERANCE {
            warn!(
                "{:.0}% of the epoch intervals are off nominal, undetermined sampling rate",
                non_nominal * 100.0
            );
            SampleRateCode::Unspecified
        } else {
            SampleRateCode::from_interval(sample_interval)
        };

        Ok(TimeSpan {
            start,
            end,
            sample_interval,
            rate,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rinex::toolkit::{epochs_30s, v3_content};
    use hifitime::Epoch;

    #[test]
    fn v3_daily_file() {
        let epochs = epochs_30s("2021 12 21", 120);
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        let content = v3_content("ABMF", &refs);

        let rinex = RinexFile::parse(
            content.as_bytes(),
            "ABMF00GLP_R_20213550000_01D_30S_MO.rnx",
            Compression::Plain,
        )
        .unwrap();

        assert_eq!(rinex.version.major, 3);
        assert!(!rinex.hatanaka);
        assert_eq!(rinex.site.to_string(), "ABMF00GLP");
        assert_eq!(rinex.name_convention, Some(NameConvention::Long));
        assert_eq!(rinex.data_source, 'R');
        assert_eq!(
            rinex.span.start,
            Epoch::from_gregorian_utc_at_midnight(2021, 12, 21)
        );
        assert_eq!(rinex.span.sample_interval.to_seconds(), 30.0);
        assert_eq!(rinex.span.rate.to_string(), "30S");
    }

    #[test]
    fn site_from_marker_when_name_is_free_form() {
        let epochs = epochs_30s("2021 12 21", 10);
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        let content = v3_content("TLSE", &refs);

        let rinex =
            RinexFile::parse(content.as_bytes(), "output.rnx", Compression::Plain).unwrap();
        assert_eq!(rinex.site.four_char(), "TLSE");
        assert_eq!(rinex.name_convention, None);
    }

    #[test]
    fn multibyte_name_falls_back_on_marker() {
        let epochs = epochs_30s("2021 12 21", 10);
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        let content = v3_content("ABMF", &refs);

        // the country group ends on a two byte character, the site is
        // recovered from the marker name instead
        let rinex = RinexFile::parse(
            content.as_bytes(),
            "ABMF00GL\u{c9}_R_20213550000_01D_30S_MO.rnx",
            Compression::Plain,
        )
        .unwrap();
        assert_eq!(rinex.site.four_char(), "ABMF");
    }

    #[test]
    fn non_observation_rejected() {
        let content = "     3.04           NAVIGATION DATA     M                   RINEX VERSION / TYPE\n";
        let status = RinexFile::parse(content.as_bytes(), "BRDC00WRD_R.rnx", Compression::Plain);
        assert_eq!(status.unwrap_err(), FileError::NotObservationFile);

        let status = RinexFile::parse(b"plain text", "notes.txt", Compression::Plain);
        assert_eq!(status.unwrap_err(), FileError::NotObservationFile);
    }

    #[test]
    fn single_epoch_rejected() {
        let epochs = epochs_30s("2021 12 21", 1);
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        let content = v3_content("ABMF", &refs);
        let status = RinexFile::parse(content.as_bytes(), "abmf3550.21o", Compression::Plain);
        assert_eq!(status.unwrap_err(), FileError::InsufficientEpochs);
    }

    #[test]
    fn hatanaka_payload_recognized() {
        let content = "\
1.0                 COMPACT RINEX FORMAT                    CRINEX VERS   / TYPE
RNX2CRX ver.4.0.7                       21-Dec-21 00:10     CRINEX PROG / DATE
     2.11           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE
AJAC                                                        MARKER NAME
                                                            END OF HEADER
&21 12 21  0  0  0.0000000  0  4G10G13G15G16
3&23629347915 0
&21 12 21  0  0 30.0000000  0  4G10G13G15G16
-10252465
";
        let rinex =
            RinexFile::parse(content.as_bytes(), "ajac3550.21d", Compression::Plain).unwrap();
        assert!(rinex.hatanaka);
        assert_eq!(rinex.version.major, 2);
        assert_eq!(rinex.span.sample_interval.to_seconds(), 30.0);
        // the compressed body itself is preserved verbatim
        let text = String::from_utf8(rinex.serialize()).unwrap();
        assert!(text.contains("3&23629347915 0"));
    }

    #[test]
    fn v2_file_recognized() {
        let content = "     2.11           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE
teqc  2019Feb25                         20210107 00:10:06UTCPGM / RUN BY / DATE
AJAC                                                        MARKER NAME
                                                            END OF HEADER
 21 12 21  0  0  0.0000000  0  4G10G13G15G16
  23629347.915   124182592.425        41.000
 21 12 21  0  0 30.0000000  0  4G10G13G15G16
  23619095.450   124128694.742        41.250
 21 12 21  0  1  0.0000000  0  4G10G13G15G16
  23608852.310   124074809.921        41.000
";
        let rinex =
            RinexFile::parse(content.as_bytes(), "ajac3550.21o", Compression::Plain).unwrap();
        assert_eq!(rinex.version.major, 2);
        assert_eq!(rinex.site.four_char(), "AJAC");
        assert_eq!(rinex.span.sample_interval.to_seconds(), 30.0);
        assert_eq!(
            rinex.span.end,
            Epoch::from_gregorian_utc(2021, 12, 21, 0, 1, 0, 0)
        );
    }

    #[test]
    fn irregular_sampling_reported_unspecified() {
        // half the gaps nominal, half erratic
        let mut epochs = Vec::new();
        let mut secs = 0;
        for i in 0..40 {
            epochs.push(format!("2021 12 21 00 {:02} {:2}.0000000  0", secs / 60, secs % 60));
            secs += if i % 2 == 0 { 30 } else { 17 };
        }
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        let content = v3_content("ABMF", &refs);
        let rinex =
            RinexFile::parse(content.as_bytes(), "abmf3550.21o", Compression::Plain).unwrap();
        assert_eq!(rinex.span.rate, SampleRateCode::Unspecified);
    }
}
