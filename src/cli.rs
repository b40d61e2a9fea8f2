//! Command line definition and validation.
use std::path::PathBuf;

use clap::Parser;
use walkdir::WalkDir;

use crate::compression::Compression;
use crate::error::ConfigError;
use crate::meta::MetaStore;
use crate::mutation::Overrides;
use crate::production::{NameConvention, PrecisionMode};
use crate::site::{NineCharCatalog, SiteId};

#[derive(Parser, Debug)]
#[command(
    name = "rinexmod",
    version,
    about = "Normalize RINEX observation file metadata and names",
    long_about = "Rewrites observation file headers from IGS site logs, GAMIT \
station.info tables or explicit keyword values, and renames the files under \
the standardized short or long convention, derived from their actual content."
)]
pub struct Cli {
    /// Input observation files or directories (scanned recursively)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output folder root
    #[arg(short, long)]
    pub output: PathBuf,

    /// IGS site log file, or directory of site logs
    #[arg(short, long)]
    pub sitelog: Option<PathBuf>,

    /// GAMIT station.info table (requires --lfile)
    #[arg(long)]
    pub station_info: Option<PathBuf>,

    /// GAMIT position catalog, apr or L-file (requires --station-info)
    #[arg(long)]
    pub lfile: Option<PathBuf>,

    /// Header modification keyword, `keyword:value` (repeatable)
    #[arg(short = 'k', long = "modif-kw", value_name = "KEYWORD:VALUE")]
    pub modif_kw: Vec<String>,

    /// Apply a single loaded metadata source even when its site does
    /// not match, and settle multi-source matches by preparation date
    #[arg(short, long)]
    pub force: bool,

    /// Tolerate firmware-only instrumentation changes over the file
    /// time window
    #[arg(short, long)]
    pub ignore: bool,

    /// Rename the site (4 or 9 characters)
    #[arg(short, long)]
    pub marker: Option<String>,

    /// Catalog file expanding 4 character codes to 9 characters
    #[arg(short, long)]
    pub ninecharfile: Option<PathBuf>,

    /// Force the ISO-3166 alpha-3 country segment
    #[arg(short, long)]
    pub country: Option<String>,

    /// Force long convention output names
    #[arg(short, long)]
    pub longname: bool,

    /// Force short convention output names
    #[arg(long)]
    pub shortname: bool,

    /// Output name precision: basic, flex or exact
    #[arg(long, default_value = "basic", value_name = "STYLE")]
    pub filename_style: PrecisionMode,

    /// Path component below which the input subtree is reproduced
    /// under the output root
    #[arg(short, long, value_name = "COMPONENT")]
    pub relative: Option<String>,

    /// Output compression: gz or none (long names default to gz)
    #[arg(long)]
    pub compression: Option<Compression>,

    /// Remove input files once their product is written
    #[arg(long)]
    pub remove: bool,

    /// Inline the source's full instrumentation history as comments
    #[arg(long)]
    pub full_history: bool,

    /// Write the grouped product lists under this folder
    #[arg(long, value_name = "DIR")]
    pub lists: Option<PathBuf>,

    /// Verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated runtime configuration, metadata sources loaded.
pub struct Settings {
    pub store: MetaStore,
    pub overrides: Overrides,
    pub force: bool,
    pub ignore_firmware: bool,
    pub precision: PrecisionMode,
    pub convention: Option<NameConvention>,
    pub catalog: NineCharCatalog,
    pub country: Option<String>,
    pub marker: Option<SiteId>,
    pub output: PathBuf,
    pub relative: Option<String>,
    pub compression: Option<Compression>,
    pub remove: bool,
    pub full_history: bool,
    pub lists: Option<PathBuf>,
}

impl Cli {
    /// Validate the command line and load every metadata source.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        if self.longname && self.shortname {
            return Err(ConfigError::ShortLongConflict);
        }
        let convention = if self.longname {
            Some(NameConvention::Long)
        } else if self.shortname {
            Some(NameConvention::Short)
        } else {
            None
        };

        let mut overrides = Overrides::default();
        for pair in &self.modif_kw {
            overrides.push_pair(pair)?;
        }

        let marker = self
            .marker
            .as_deref()
            .map(|m| {
                m.parse::<SiteId>()
                    .map_err(|_| ConfigError::InvalidSiteName(m.to_string()))
            })
            .transpose()?;

        let country = self
            .country
            .map(|c| {
                if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                    Ok(c.to_uppercase())
                } else {
                    Err(ConfigError::InvalidCountryCode(c))
                }
            })
            .transpose()?;

        let catalog = match &self.ninecharfile {
            Some(path) => NineCharCatalog::from_file(path)
                .map_err(|_| ConfigError::MissingNineCharFile(path.display().to_string()))?,
            None => NineCharCatalog::default(),
        };

        let mut store = MetaStore::default();
        if let Some(sitelog) = &self.sitelog {
            store
                .load_sitelogs(sitelog)
                .map_err(|e| ConfigError::MissingMetadataSource(e.to_string()))?;
        }
        match (&self.station_info, &self.lfile) {
            (Some(info), Some(lfile)) => {
                store
                    .load_gamit(info, lfile)
                    .map_err(|e| ConfigError::MissingMetadataSource(e.to_string()))?;
            },
            (None, None) => {},
            _ => return Err(ConfigError::IncompleteGamitPair),
        }

        Ok(Settings {
            store,
            overrides,
            force: self.force,
            ignore_firmware: self.ignore,
            precision: self.filename_style,
            convention,
            catalog,
            country,
            marker,
            output: self.output,
            relative: self.relative,
            compression: self.compression,
            remove: self.remove,
            full_history: self.full_history,
            lists: self.lists,
        })
    }
}

/// Expand the input arguments: files are taken as-is, directories are
/// walked for conventionally named observation files.
pub fn gather_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let looks_like_rinex = entry
                    .file_name()
                    .to_str()
                    .map_or(false, |name| NameConvention::detect(name).is_some());
                if looks_like_rinex {
                    inputs.push(entry.into_path());
                }
            }
        } else {
            inputs.push(path.clone());
        }
    }
    inputs
}
