//! In place header edition. Each method rewrites (or inserts) one
//! labeled line at its fixed 60 + 20 column layout, leaving the rest
//! of the buffer untouched.
use crate::constellation::Constellation;
use crate::epoch::{now, pgm_timestamp};
use crate::hardware::GroundPosition;
use crate::site::SiteId;

use super::RinexFile;

impl RinexFile {
    /// Rewrite this labeled line, or insert it before the first anchor
    /// label found (before `END OF HEADER` as a last resort).
    fn upsert_label(&mut self, label: &str, content: String, anchors: &[&str]) {
        let line = format!("{:<60}{}", content, label);
        if let Some(idx) = self.find_label(label) {
            self.lines[idx] = line;
        } else {
            let idx = anchors
                .iter()
                .find_map(|anchor| self.find_label(anchor))
                .or_else(|| self.header_end_index())
                .unwrap_or(0);
            self.lines.insert(idx, line);
        }
    }

    /// Update `MARKER NAME` (and `MARKER NUMBER` when provided), also
    /// tracking the site field of the model.
    pub fn set_marker(&mut self, name: &str, number: Option<&str>) {
        if let Ok(site) = name.parse::<SiteId>() {
            self.site.rename(&site);
        }
        self.upsert_label(
            "MARKER NAME",
            format!("{:<60}", name),
            &["MARKER NUMBER", "OBSERVER / AGENCY"],
        );
        if let Some(number) = number {
            self.upsert_label(
                "MARKER NUMBER",
                format!("{:<60}", number),
                &["OBSERVER / AGENCY"],
            );
        }
    }

    /// Update the `MARKER NUMBER` line alone.
    pub fn set_marker_number(&mut self, number: &str) {
        self.upsert_label(
            "MARKER NUMBER",
            format!("{:<60}", number),
            &["OBSERVER / AGENCY"],
        );
    }

    /// Update the `REC # / TYPE / VERS` line. `None` fields keep their
    /// current header value.
    pub fn set_receiver(&mut self, sn: Option<&str>, model: Option<&str>, firmware: Option<&str>) {
        let current = self.receiver().unwrap_or_default();
        let content = format!(
            "{:<20}{:<20}{:<20}",
            sn.unwrap_or(&current.sn),
            model.unwrap_or(&current.model),
            firmware.unwrap_or(&current.firmware),
        );
        self.upsert_label("REC # / TYPE / VERS", content, &["ANT # / TYPE"]);
    }

    /// Update the `ANT # / TYPE` line. `None` fields keep their
    /// current header value.
    pub fn set_antenna(&mut self, sn: Option<&str>, model: Option<&str>) {
        let current = self.antenna().unwrap_or_default();
        let content = format!(
            "{:<20}{:<20}{:<20}",
            sn.unwrap_or(&current.sn),
            model.unwrap_or(&current.model),
            "",
        );
        self.upsert_label("ANT # / TYPE", content, &["APPROX POSITION XYZ"]);
    }

    /// Update the `APPROX POSITION XYZ` line, component wise.
    pub fn set_position(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let current = self.ground_position().unwrap_or_default();
        let position = GroundPosition::new(
            x.unwrap_or(current.x),
            y.unwrap_or(current.y),
            z.unwrap_or(current.z),
        );
        self.upsert_label(
            "APPROX POSITION XYZ",
            format!("{}{:<18}", position, ""),
            &["ANTENNA: DELTA H/E/N"],
        );
    }

    /// Update the `ANTENNA: DELTA H/E/N` eccentricities, component wise.
    pub fn set_antenna_delta(&mut self, h: Option<f64>, e: Option<f64>, n: Option<f64>) {
        let current = self.antenna().unwrap_or_default();
        let content = format!(
            "{:14.4}{:14.4}{:14.4}{:<18}",
            h.or(current.height).unwrap_or(0.0),
            e.or(current.eastern).unwrap_or(0.0),
            n.or(current.northern).unwrap_or(0.0),
            "",
        );
        self.upsert_label(
            "ANTENNA: DELTA H/E/N",
            content,
            &["SYS / # / OBS TYPES", "# / TYPES OF OBSERV"],
        );
    }

    /// Update the `OBSERVER / AGENCY` line. `None` fields keep their
    /// current header value.
    pub fn set_agencies(&mut self, operator: Option<&str>, agency: Option<&str>) {
        let current = self.agency().unwrap_or_default();
        let content = format!(
            "{:<20}{:<40}",
            operator.unwrap_or(&current.operator),
            agency.unwrap_or(&current.agency),
        );
        self.upsert_label("OBSERVER / AGENCY", content, &["REC # / TYPE / VERS"]);
    }

    /// Rewrite the satellite system field of the `RINEX VERSION / TYPE`
    /// line, first 40 columns preserved.
    pub fn set_sat_system(&mut self, constellation: Constellation) {
        if let Some(idx) = self.find_label("RINEX VERSION / TYPE") {
            let line = &self.lines[idx];
            let head = format!("{:<40}", line.get(..40).unwrap_or(line));
            self.lines[idx] = format!(
                "{}{:<20}RINEX VERSION / TYPE",
                head,
                format!("{} ({})", constellation.code(), constellation.label()),
            );
        }
    }

    /// Update the `INTERVAL` line (seconds), inserting it right before
    /// `TIME OF FIRST OBS` when absent.
    pub fn set_interval(&mut self, seconds: f64) {
        let content = format!("{:10.3}{:<50}", seconds, "");
        self.upsert_label("INTERVAL", content, &["TIME OF FIRST OBS"]);
    }

    /// Align `TIME OF FIRST OBS` / `TIME OF LAST OBS` with the epochs
    /// actually present in the content. The time system tag of the
    /// existing first-obs line is preserved, `GPS` per default.
    pub fn set_time_obs(&mut self) {
        let system = self
            .find_label("TIME OF FIRST OBS")
            .and_then(|idx| self.lines[idx].get(48..51))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "GPS".to_string());

        let time_line = |e: hifitime::Epoch| {
            let (y, m, d, hh, mm, ss, ns) = e.to_gregorian_utc();
            let seconds = f64::from(ss) + f64::from(ns) * 1.0E-9;
            format!(
                "{:6}{:6}{:6}{:6}{:6}{:13.7}     {:<3}{:<8}",
                y, m, d, hh, mm, seconds, system, ""
            )
        };

        self.upsert_label(
            "TIME OF FIRST OBS",
            time_line(self.span.start),
            &["TIME OF LAST OBS", "SYS / PHASE SHIFT"],
        );
        // last obs goes right after first obs when absent
        if self.find_label("TIME OF LAST OBS").is_none() {
            if let Some(idx) = self.find_label("TIME OF FIRST OBS") {
                self.lines.insert(
                    idx + 1,
                    format!("{:<60}TIME OF LAST OBS", time_line(self.span.end)),
                );
                return;
            }
        }
        self.upsert_label("TIME OF LAST OBS", time_line(self.span.end), &[]);
    }

    /// Append a free text comment. Short comments are centered and
    /// dash padded so they stand out of the machine written ones.
    pub fn push_comment(&mut self, text: &str) {
        let content = if text.chars().count() < 57 {
            format!("{:-^59}", format!(" {} ", text))
        } else {
            let cut = text.char_indices().nth(59).map_or(text.len(), |(i, _)| i);
            format!("{:<59}", &text[..cut])
        };
        let line = format!("{} COMMENT", content);

        let idx = self
            .last_comment_index()
            .map(|i| i + 1)
            .or_else(|| self.find_label("PGM / RUN BY / DATE").map(|i| i + 1))
            .or_else(|| self.header_end_index())
            .unwrap_or(0);
        self.lines.insert(idx, line);
    }

    fn last_comment_index(&self) -> Option<usize> {
        let end = self.header_end_index().unwrap_or(self.lines.len());
        self.lines[..end]
            .iter()
            .rposition(|line| line.get(60..).map_or(false, |l| l.contains("COMMENT")))
    }

    /// Stamp the `PGM / RUN BY / DATE` line with this program and the
    /// current wall clock.
    pub fn set_pgm_run_by_date(&mut self, program: &str, run_by: &str) {
        let content = format!("{:<20}{:<20}{:<20}", program, run_by, pgm_timestamp(now()));
        self.upsert_label("PGM / RUN BY / DATE", content, &["MARKER NAME"]);
    }

    /// Regroup all header comments right after `PGM / RUN BY / DATE`,
    /// original order preserved.
    pub fn sort_header(&mut self) {
        let end = match self.header_end_index() {
            Some(end) => end,
            None => return,
        };
        let mut comments = Vec::new();
        let mut kept = Vec::with_capacity(self.lines.len());
        for (i, line) in self.lines.iter().enumerate() {
            if i < end && line.get(60..).map_or(false, |l| l.contains("COMMENT")) {
                comments.push(line.clone());
            } else {
                kept.push(line.clone());
            }
        }
        if comments.is_empty() {
            return;
        }
        self.lines = kept;
        let at = self
            .find_label("PGM / RUN BY / DATE")
            .map(|i| i + 1)
            .or_else(|| self.header_end_index())
            .unwrap_or(0);
        for (offset, comment) in comments.into_iter().enumerate() {
            self.lines.insert(at + offset, comment);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::Compression;
    use crate::rinex::toolkit::{epochs_30s, v3_content};

    fn fixture() -> RinexFile {
        let epochs = epochs_30s("2021 12 21", 10);
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        RinexFile::parse(
            v3_content("ABMF", &refs).as_bytes(),
            "ABMF00GLP_R_20213550000_01D_30S_MO.rnx",
            Compression::Plain,
        )
        .unwrap()
    }

    #[test]
    fn receiver_partial_update() {
        let mut rinex = fixture();
        rinex.set_receiver(None, None, Some("5.5.0"));
        let rcvr = rinex.receiver().unwrap();
        assert_eq!(rcvr.sn, "3001355");
        assert_eq!(rcvr.model, "SEPT POLARX5");
        assert_eq!(rcvr.firmware, "5.5.0");
    }

    #[test]
    fn antenna_full_update() {
        let mut rinex = fixture();
        rinex.set_antenna(Some("725063"), Some("TRM115000.00    NONE"));
        let ant = rinex.antenna().unwrap();
        assert_eq!(ant.sn, "725063");
        assert_eq!(ant.model, "TRM115000.00    NONE");
    }

    #[test]
    fn marker_rename_tracks_site() {
        let mut rinex = fixture();
        rinex.set_marker("KMS300DNK", Some("10114M001"));
        assert_eq!(rinex.site.to_string(), "KMS300DNK");
        assert_eq!(rinex.marker_name().unwrap(), "KMS300DNK");
        let idx = rinex.find_label("MARKER NUMBER").unwrap();
        assert!(rinex.lines[idx].starts_with("10114M001"));
    }

    #[test]
    fn position_and_delta_lines() {
        let mut rinex = fixture();
        rinex.set_position(Some(3628427.9118), Some(562059.0936), None);
        let pos = rinex.ground_position().unwrap();
        assert_eq!(pos.x, 3628427.9118);
        assert_eq!(pos.z, 4239678.3040);

        rinex.set_antenna_delta(Some(0.061), None, None);
        let ant = rinex.antenna().unwrap();
        assert_eq!(ant.height, Some(0.061));
        assert_eq!(ant.eastern, Some(0.0));
    }

    #[test]
    fn comment_layout_and_placement() {
        let mut rinex = fixture();
        rinex.push_comment("FILE MODIFIED");
        let comments = rinex.comments();
        assert_eq!(comments.len(), 1);
        // centered, dash padded, 59 visible columns
        assert!(comments[0].starts_with("----"));
        assert!(comments[0].contains(" FILE MODIFIED "));
        // placed right after the PGM line
        let pgm = rinex.find_label("PGM / RUN BY / DATE").unwrap();
        let comment = rinex.find_label("COMMENT").unwrap();
        assert_eq!(comment, pgm + 1);

        rinex.push_comment("SECOND NOTE");
        assert_eq!(rinex.comments().len(), 2);
        assert_eq!(rinex.find_label("COMMENT").unwrap(), pgm + 1);
    }

    #[test]
    fn long_comment_truncated_on_char_boundary() {
        let mut rinex = fixture();
        // the 60th byte falls inside the two byte accent
        rinex.push_comment(&format!("{}\u{e9}x", "A".repeat(58)));
        let comments = rinex.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].chars().count(), 59);
        assert!(comments[0].starts_with("AAAA"));
        assert!(!comments[0].contains('x'));
    }

    #[test]
    fn interval_inserted_before_first_obs() {
        let mut rinex = fixture();
        // drop the stock INTERVAL line
        let idx = rinex.find_label("INTERVAL").unwrap();
        rinex.lines.remove(idx);
        rinex.set_interval(30.0);
        let interval = rinex.find_label("INTERVAL").unwrap();
        let first_obs = rinex.find_label("TIME OF FIRST OBS").unwrap();
        assert_eq!(interval + 1, first_obs);
        assert!(rinex.lines[interval].starts_with("    30.000"));
    }

    #[test]
    fn time_obs_lines_follow_content() {
        let mut rinex = fixture();
        rinex.set_time_obs();
        let first = rinex.find_label("TIME OF FIRST OBS").unwrap();
        let last = rinex.find_label("TIME OF LAST OBS").unwrap();
        assert_eq!(last, first + 1);
        assert!(rinex.lines[first].starts_with("  2021    12    21     0     0    0.0000000     GPS"));
        assert!(rinex.lines[last].starts_with("  2021    12    21     0     4   30.0000000     GPS"));
    }

    #[test]
    fn sat_system_rewrite() {
        let mut rinex = fixture();
        rinex.set_sat_system(Constellation::GPS);
        assert_eq!(rinex.constellation(), Constellation::GPS);
        let idx = rinex.find_label("RINEX VERSION / TYPE").unwrap();
        assert!(rinex.lines[idx].contains("G (GPS)"));
    }
}
