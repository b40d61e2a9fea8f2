//! Instrumentation resolution: pick, for one file's time window, the
//! hardware state the metadata sources declare.
use hifitime::Epoch;
use log::{debug, warn};

use crate::error::FileError;
use crate::hardware::AgencyInfo;
use crate::site::SiteId;

use super::{InstrumentationRecord, MetaStore, SiteMeta, SourceKind};

/// Resolution policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverPolicy {
    /// Apply the single loaded source even when its site does not
    /// match the file, and arbitrate ambiguous multi-source matches
    /// by latest preparation date.
    pub force: bool,
    /// Allow merging consecutive periods that only differ by receiver
    /// firmware when no single period covers the file.
    pub ignore_firmware: bool,
}

/// Outcome of a successful resolution. `warnings` carries the
/// non-fatal degradations that were accepted along the way.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Site identity as the source document declares it.
    pub site: SiteId,
    pub record: InstrumentationRecord,
    pub agency: AgencyInfo,
    pub domes: Option<String>,
    pub source: String,
    pub kind: SourceKind,
    /// Number of periods folded into `record` (1: no merge).
    pub merged_from: usize,
    pub forced_site: bool,
    pub warnings: Vec<FileError>,
    /// Complete instrumentation history of the source, for optional
    /// inlining into the produced header.
    pub history: Vec<InstrumentationRecord>,
}

/// Resolve the instrumentation in effect over `[start, end]` for this
/// site. The returned record always covers the whole window: partial
/// coverage is treated as no coverage.
pub fn resolve(
    store: &MetaStore,
    site: &SiteId,
    start: Epoch,
    end: Epoch,
    policy: ResolverPolicy,
) -> Result<Resolution, FileError> {
    let mut warnings = Vec::new();

    let matching = store.for_site(site);
    let (meta, forced_site) = match matching.len() {
        0 => {
            if policy.force && store.len() == 1 {
                warn!(
                    "{}: does not match source {}, forced through",
                    site,
                    store.sources()[0].source
                );
                warnings.push(FileError::SiteMismatchForced);
                (&store.sources()[0], true)
            } else {
                return Err(FileError::SiteMismatch);
            }
        },
        1 => (matching[0], false),
        _ => {
            if !policy.force {
                return Err(FileError::AmbiguousMultipleSitelogs);
            }
            let latest = matching
                .iter()
                .max_by_key(|meta| meta.prepared)
                .copied()
                .ok_or(FileError::AmbiguousMultipleSitelogs)?;
            warn!(
                "{}: {} sources match, keeping the latest prepared ({})",
                site,
                matching.len(),
                latest.source
            );
            (latest, false)
        },
    };

    let (record, merged_from) = select_record(meta, start, end, policy.ignore_firmware)?;
    if merged_from > 1 {
        warn!(
            "{}: {} firmware-only periods of {} merged to cover the file",
            site, merged_from, meta.source
        );
        warnings.push(FileError::MergedFirmwarePeriods);
    }

    debug!(
        "{}: instrumentation from {} [{} - {:?}]",
        site, meta.source, record.from, record.until
    );

    Ok(Resolution {
        site: meta.site.clone(),
        record,
        agency: meta.agency.clone(),
        domes: meta.domes.clone(),
        source: meta.source.clone(),
        kind: meta.kind,
        merged_from,
        forced_site,
        warnings,
        history: meta.records.clone(),
    })
}

/// The record of this source covering the window, merging firmware
/// only runs when allowed. Overlapping covering periods are settled
/// in favor of the latest validity start.
fn select_record(
    meta: &SiteMeta,
    start: Epoch,
    end: Epoch,
    ignore_firmware: bool,
) -> Result<(InstrumentationRecord, usize), FileError> {
    let covering: Vec<&InstrumentationRecord> = meta
        .records
        .iter()
        .filter(|record| record.covers(start, end))
        .collect();

    if covering.len() > 1 {
        warn!(
            "{}: {} overlapping periods cover the file, keeping the latest starting one",
            meta.site,
            covering.len()
        );
    }
    if let Some(record) = covering
        .iter()
        .max_by_key(|record| record.from)
    {
        return Ok(((*record).clone(), 1));
    }

    if ignore_firmware {
        if let Some(run) = firmware_run_covering(&meta.records, start, end) {
            let merged_from = run.len();
            // merged period takes the hardware of its latest member
            let mut record = run[merged_from - 1].clone();
            record.from = run[0].from;
            record.until = run[merged_from - 1].until;
            return Ok((record, merged_from));
        }
    }

    Err(FileError::NoCoverage)
}

/// Longest run of contiguous, firmware-only-differing periods whose
/// union covers the window, if any.
fn firmware_run_covering(
    records: &[InstrumentationRecord],
    start: Epoch,
    end: Epoch,
) -> Option<Vec<InstrumentationRecord>> {
    let mut best: Option<Vec<InstrumentationRecord>> = None;
    for i in 0..records.len() {
        let mut j = i;
        while j + 1 < records.len()
            && records[j].until == Some(records[j + 1].from)
            && records[j].firmware_change_only(&records[j + 1])
        {
            j += 1;
        }
        if j > i {
            let union_from = records[i].from;
            let union_until = records[j].until;
            let covers = union_from <= start && union_until.map_or(true, |u| end <= u);
            let longer = best.as_ref().map_or(true, |b| j + 1 - i > b.len());
            if covers && longer {
                best = Some(records[i..=j].to_vec());
            }
        }
    }
    best
}
