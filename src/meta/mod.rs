//! Site metadata: instrumentation histories gathered from external
//! source documents (IGS site logs, GAMIT station.info tables).
use std::path::{Path, PathBuf};

use hifitime::Epoch;
use log::warn;
use thiserror::Error;
use walkdir::WalkDir;

use crate::hardware::{AgencyInfo, Antenna, GroundPosition, Receiver};
use crate::site::SiteId;

pub mod gamit;
pub mod sitelog;

mod resolver;
pub use resolver::{resolve, Resolution, ResolverPolicy};

#[derive(Debug, Error)]
pub enum Error {
    #[error("no such metadata source: {0}")]
    MissingSource(String),
    #[error("no usable metadata source found under {0}")]
    EmptySourceSet(String),
    #[error("unparsable metadata source {0}: {1}")]
    Unparsable(String, String),
}

/// Kind of document an instrumentation history came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// IGS site log
    Sitelog,
    /// GAMIT station.info + position catalog pair
    StationInfo,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Sitelog => write!(f, "sitelog"),
            Self::StationInfo => write!(f, "station.info"),
        }
    }
}

/// One instrumentation period: the hardware state of a site over a
/// validity window. The window is half open, `until = None` meaning
/// still current.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentationRecord {
    pub from: Epoch,
    pub until: Option<Epoch>,
    pub receiver: Receiver,
    pub antenna: Antenna,
    pub position: Option<GroundPosition>,
}

impl InstrumentationRecord {
    /// Whether this period fully covers the [start, end] data window.
    pub fn covers(&self, start: Epoch, end: Epoch) -> bool {
        self.from <= start && self.until.map_or(true, |until| end <= until)
    }

    /// Whether the other record only differs by receiver firmware.
    pub fn firmware_change_only(&self, other: &Self) -> bool {
        self.receiver.sn == other.receiver.sn
            && self.receiver.model == other.receiver.model
            && self.antenna == other.antenna
    }
}

/// Everything one source document says about one site.
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub site: SiteId,
    /// Chronologically ordered instrumentation periods.
    pub records: Vec<InstrumentationRecord>,
    /// Document preparation date, arbitrates between several documents
    /// describing the same site.
    pub prepared: Epoch,
    pub agency: AgencyInfo,
    /// IERS DOMES number of the monument, when the document carries one.
    pub domes: Option<String>,
    /// Source document (file name), for audit trails.
    pub source: String,
    pub kind: SourceKind,
}

/// Loaded metadata sources, read-only once built and shared across
/// parallel file transforms.
#[derive(Debug, Default)]
pub struct MetaStore {
    sources: Vec<SiteMeta>,
}

impl MetaStore {
    /// Load site logs from a single file or a directory (scanned
    /// recursively for `*.log` files). Unparsable documents are
    /// skipped with a warning, an empty result set is an error.
    pub fn load_sitelogs<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingSource(path.display().to_string()));
        }
        let candidates: Vec<PathBuf> = if path.is_dir() {
            WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    e.path()
                        .extension()
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("log"))
                })
                .map(|e| e.into_path())
                .collect()
        } else {
            vec![path.to_path_buf()]
        };

        let mut loaded = 0;
        for candidate in candidates {
            match sitelog::parse_file(&candidate) {
                Ok(meta) => {
                    self.sources.push(meta);
                    loaded += 1;
                },
                Err(e) => {
                    warn!("skipping {}: {}", candidate.display(), e);
                },
            }
        }
        if loaded == 0 {
            return Err(Error::EmptySourceSet(path.display().to_string()));
        }
        Ok(())
    }

    /// Load a GAMIT station.info table together with its position
    /// catalog (apr / L-file). Both members are mandatory.
    pub fn load_gamit<P: AsRef<Path>>(&mut self, station_info: P, lfile: P) -> Result<(), Error> {
        let sources = gamit::parse_pair(station_info.as_ref(), lfile.as_ref())?;
        if sources.is_empty() {
            return Err(Error::EmptySourceSet(
                station_info.as_ref().display().to_string(),
            ));
        }
        self.sources.extend(sources);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// All loaded documents, site filter left to the resolver.
    pub fn sources(&self) -> &[SiteMeta] {
        &self.sources
    }

    /// Documents describing this site.
    pub fn for_site(&self, site: &SiteId) -> Vec<&SiteMeta> {
        self.sources
            .iter()
            .filter(|meta| meta.site.matches(site))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_sources(sources: Vec<SiteMeta>) -> Self {
        Self { sources }
    }
}
