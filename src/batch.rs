//! Batch driver: run the per file pipeline over a whole input set in
//! parallel and aggregate the outcomes.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rayon::prelude::*;

use crate::epoch::{long_name_timestamp, now};
use crate::fops::{transform, TransformContext, TransformReport};

/// Outcome of a whole batch.
pub struct BatchSummary {
    pub reports: Vec<TransformReport>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.status.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    /// Produced files grouped by `v{major}_{rate}_{period}`, the way
    /// downstream submission chains consume them.
    pub fn grouped_outputs(&self) -> BTreeMap<String, Vec<&Path>> {
        let mut groups: BTreeMap<String, Vec<&Path>> = BTreeMap::new();
        for report in &self.reports {
            if let (Some(group), Some(output)) = (&report.group, &report.output) {
                groups.entry(group.clone()).or_default().push(output);
            }
        }
        groups
    }

    /// Write one list file per group under `dir`. Returns the written
    /// list paths.
    pub fn write_lists(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let groups = self.grouped_outputs();
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(dir)?;
        let stamp = long_name_timestamp(now());
        let mut written = Vec::with_capacity(groups.len());
        for (group, outputs) in groups {
            let path = dir.join(format!("rinexmod_{}_{}.lst", group, stamp));
            let mut fd = std::fs::File::create(&path)?;
            for output in outputs {
                writeln!(fd, "{}", output.display())?;
            }
            written.push(path);
        }
        Ok(written)
    }

    /// Log the one line outcome of every file, errors last.
    pub fn log_results(&self) {
        for report in self.reports.iter().filter(|r| r.status.is_ok()) {
            info!("{}", report.status_line());
            for warning in &report.warnings {
                warn!("{} - {}", warning, report.input.display());
            }
        }
        for report in self.reports.iter().filter(|r| r.status.is_err()) {
            error!("{}", report.status_line());
        }
    }
}

/// Transform every input, in parallel, against a shared read-only
/// context. Input order is preserved in the summary.
pub fn run(inputs: &[PathBuf], ctx: &TransformContext) -> BatchSummary {
    let reports: Vec<TransformReport> = inputs
        .par_iter()
        .map(|input| transform(input, ctx))
        .collect();
    BatchSummary { reports }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::FileError;

    fn report(input: &str, group: Option<&str>, ok: bool) -> TransformReport {
        TransformReport {
            input: PathBuf::from(input),
            output: group.map(|_| PathBuf::from(format!("/out/{}", input))),
            status: if ok {
                Ok(())
            } else {
                Err(FileError::InsufficientEpochs)
            },
            warnings: Vec::new(),
            group: group.map(|g| g.to_string()),
        }
    }

    #[test]
    fn grouping_and_counts() {
        let summary = BatchSummary {
            reports: vec![
                report("a.rnx", Some("v3_30S_01D"), true),
                report("b.rnx", Some("v3_30S_01D"), true),
                report("c.21o", Some("v2_01S_01H"), true),
                report("d.rnx", None, false),
            ],
        };
        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.failed(), 1);

        let groups = summary.grouped_outputs();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["v3_30S_01D"].len(), 2);
        assert_eq!(groups["v2_01S_01H"].len(), 1);
    }

    #[test]
    fn list_files_written_per_group() {
        let dir = std::env::temp_dir().join(format!("rinexmod-lists-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let summary = BatchSummary {
            reports: vec![
                report("a.rnx", Some("v3_30S_01D"), true),
                report("c.21o", Some("v2_01S_01H"), true),
            ],
        };
        let written = summary.write_lists(&dir).unwrap();
        assert_eq!(written.len(), 2);
        let content = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(content.trim(), "/out/a.rnx");
    }
}
