//! Per file transform pipeline: load, resolve, mutate, rename, write.
use std::path::{Component, Path, PathBuf};

use log::{info, warn};

use crate::compression::{compress, Compression};
use crate::error::FileError;
use crate::meta::{resolve, MetaStore, Resolution, ResolverPolicy};
use crate::mutation::{self, Overrides};
use crate::production::{NameConvention, PrecisionMode};
use crate::rinex::RinexFile;
use crate::site::{NineCharCatalog, SiteId};

/// Everything a single file transform needs, shared read-only across
/// the batch.
pub struct TransformContext<'a> {
    pub store: &'a MetaStore,
    pub overrides: &'a Overrides,
    pub policy: ResolverPolicy,
    pub precision: PrecisionMode,
    /// Forced output convention; input convention (or the natural one
    /// for the revision) otherwise.
    pub convention: Option<NameConvention>,
    pub catalog: &'a NineCharCatalog,
    /// Country segment forced from the command line.
    pub country: Option<&'a str>,
    /// Site renaming forced from the command line.
    pub marker: Option<&'a SiteId>,
    /// Output folder root.
    pub output: &'a Path,
    /// Path component below which the input subtree is reproduced
    /// under the output root.
    pub relative: Option<&'a str>,
    /// Output compression override.
    pub compression: Option<Compression>,
    pub remove_input: bool,
    pub full_history: bool,
}

/// Outcome of one file transform, as surfaced in result logs and
/// grouped output lists.
#[derive(Debug)]
pub struct TransformReport {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub status: Result<(), FileError>,
    pub warnings: Vec<FileError>,
    /// `v{major}_{rate}_{period}` grouping key of the produced file.
    pub group: Option<String>,
}

impl TransformReport {
    fn failed(input: &Path, error: FileError) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            status: Err(error),
            warnings: Vec::new(),
            group: None,
        }
    }

    /// One line summary, `00` meaning success.
    pub fn status_line(&self) -> String {
        match &self.status {
            Ok(()) => format!("00 - ok - {}", self.input.display()),
            Err(e) => format!("{} - {}", e, self.input.display()),
        }
    }
}

/// Run the whole pipeline on one input file.
pub fn transform(input: &Path, ctx: &TransformContext) -> TransformReport {
    match run(input, ctx) {
        Ok(report) => report,
        Err(error) => TransformReport::failed(input, error),
    }
}

fn run(input: &Path, ctx: &TransformContext) -> Result<TransformReport, FileError> {
    let out_dir = output_dir(input, ctx)?;
    let mut warnings = Vec::new();

    let mut rinex = RinexFile::from_path(input)?;

    if let Some(marker) = ctx.marker {
        let name = if rinex.version.is_modern() {
            marker.to_string()
        } else {
            marker.four_char().to_string()
        };
        rinex.set_marker(&name, None);
        rinex.site.rename(marker);
    }

    let resolution: Option<Resolution> = if ctx.store.is_empty() {
        None
    } else {
        Some(resolve(
            ctx.store,
            &rinex.site,
            rinex.span.start,
            rinex.span.end,
            ctx.policy,
        )?)
    };

    warnings.extend(mutation::apply(
        &mut rinex,
        resolution.as_ref(),
        ctx.overrides,
        ctx.full_history,
    )?);

    let convention = ctx
        .convention
        .or(rinex.name_convention)
        .unwrap_or(if rinex.version.is_modern() {
            NameConvention::Long
        } else {
            NameConvention::Short
        });

    resolve_country(&mut rinex, ctx, convention, &mut warnings);

    // the long convention mandates gzip containers
    let compression = ctx.compression.unwrap_or(match convention {
        NameConvention::Long => Compression::Gzip,
        NameConvention::Short => rinex.input_compression,
    });

    let context = rinex.naming_context();
    let filename = match convention {
        NameConvention::Long => context.long_name(ctx.precision, compression),
        NameConvention::Short => context.short_name(ctx.precision, compression),
    };
    let (period, _) = context.file_period(ctx.precision);
    let group = format!("v{}_{}_{}", rinex.version.major, context.rate, period);

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| FileError::WriteFailure(e.to_string()))?;
    let out_path = out_dir.join(&filename);
    let payload =
        compress(&rinex.serialize(), compression).map_err(FileError::from)?;
    std::fs::write(&out_path, payload).map_err(|e| FileError::WriteFailure(e.to_string()))?;
    info!("{} -> {}", input.display(), out_path.display());

    if ctx.remove_input {
        if let Err(e) = std::fs::remove_file(input) {
            warn!("could not remove {}: {}", input.display(), e);
        }
    }

    Ok(TransformReport {
        input: input.to_path_buf(),
        output: Some(out_path),
        status: Ok(()),
        warnings,
        group: Some(group),
    })
}

/// Complete the site country segment: command line flag first, then
/// the 9 character catalog. Still unresolved under the long convention
/// is a non-fatal degradation.
fn resolve_country(
    rinex: &mut RinexFile,
    ctx: &TransformContext,
    convention: NameConvention,
    warnings: &mut Vec<FileError>,
) {
    if let Some(country) = ctx.country {
        rinex.site.set_country(country);
        return;
    }
    if rinex.site.country_resolved() {
        return;
    }
    if let Some(known) = ctx.catalog.lookup(rinex.site.four_char()) {
        rinex.site.rename(known);
        return;
    }
    if convention == NameConvention::Long {
        warn!(
            "{}: country could not be resolved, using {}",
            rinex.filename,
            rinex.site
        );
        warnings.push(FileError::CountryUnresolved);
    }
}

/// Where this input's product goes. With a `relative` component the
/// input subtree below it is reproduced under the output root.
fn output_dir(input: &Path, ctx: &TransformContext) -> Result<PathBuf, FileError> {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let out_dir = match ctx.relative {
        None => ctx.output.to_path_buf(),
        Some(anchor) => {
            let components: Vec<&str> = parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => part.to_str(),
                    _ => None,
                })
                .collect();
            let at = components
                .iter()
                .position(|part| *part == anchor)
                .ok_or(FileError::UnreconstructablePath)?;
            let mut out = ctx.output.to_path_buf();
            for part in &components[at + 1..] {
                out.push(part);
            }
            out
        },
    };
    if same_directory(parent, &out_dir) {
        return Err(FileError::SameInputOutputPath);
    }
    Ok(out_dir)
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::meta::sitelog;
    use crate::rinex::toolkit::{epochs_30s, v3_content};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rinexmod-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_daily_input(dir: &Path, name: &str) -> PathBuf {
        let epochs = epochs_30s("2021 12 21", 2880);
        let refs: Vec<&str> = epochs.iter().map(|s| s.as_str()).collect();
        let path = dir.join(name);
        std::fs::write(&path, v3_content("ABMF", &refs)).unwrap();
        path
    }

    fn context<'a>(
        store: &'a MetaStore,
        overrides: &'a Overrides,
        catalog: &'a NineCharCatalog,
        output: &'a Path,
    ) -> TransformContext<'a> {
        TransformContext {
            store,
            overrides,
            policy: ResolverPolicy::default(),
            precision: PrecisionMode::Basic,
            convention: None,
            catalog,
            country: None,
            marker: None,
            output,
            relative: None,
            compression: None,
            remove_input: false,
            full_history: false,
        }
    }

    #[test]
    fn end_to_end_with_sitelog() {
        let root = scratch("e2e");
        let input_dir = root.join("in");
        std::fs::create_dir_all(&input_dir).unwrap();
        let input = write_daily_input(&input_dir, "ABMF00GLP_R_20213550000_01D_30S_MO.rnx");

        let meta = sitelog::parse(sitelog::test::ABMF_LOG, "abmf_20211201.log").unwrap();
        let store = MetaStore::from_sources(vec![meta]);
        let overrides = Overrides::default();
        let catalog = NineCharCatalog::default();
        let out = root.join("out");
        let ctx = context(&store, &overrides, &catalog, &out);

        let report = transform(&input, &ctx);
        assert!(report.status.is_ok(), "{:?}", report.status);
        let produced = report.output.unwrap();
        assert_eq!(
            produced.file_name().unwrap().to_str().unwrap(),
            "ABMF00GLP_R_20213550000_01D_30S_MO.rnx.gz"
        );
        assert_eq!(report.group.as_deref(), Some("v3_30S_01D"));

        // written gzip payload carries the rewritten header
        let packed = std::fs::read(&produced).unwrap();
        let (bytes, scheme) = crate::compression::decompress(&packed).unwrap();
        assert_eq!(scheme, Compression::Gzip);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("TRIMBLE NETR9"));
        assert!(text.contains("RINEXMOD ON"));
        // input untouched
        assert!(input.is_file());
    }

    #[test]
    fn missing_input_classified() {
        let root = scratch("missing");
        let store = MetaStore::default();
        let overrides = Overrides::default();
        let catalog = NineCharCatalog::default();
        let out = root.join("out");
        let ctx = context(&store, &overrides, &catalog, &out);
        let report = transform(&root.join("nope.rnx"), &ctx);
        assert_eq!(report.status.unwrap_err(), FileError::MissingInputFile);
    }

    #[test]
    fn same_folder_rejected_before_parsing() {
        let root = scratch("same");
        let input = write_daily_input(&root, "ABMF00GLP_R_20213550000_01D_30S_MO.rnx");
        let store = MetaStore::default();
        let overrides = Overrides::default();
        let catalog = NineCharCatalog::default();
        let ctx = context(&store, &overrides, &catalog, &root);
        let report = transform(&input, &ctx);
        assert_eq!(report.status.unwrap_err(), FileError::SameInputOutputPath);
    }

    #[test]
    fn relative_subtree_reproduced() {
        let root = scratch("relative");
        let input_dir = root.join("archive").join("2021").join("355");
        std::fs::create_dir_all(&input_dir).unwrap();
        let input = write_daily_input(&input_dir, "ABMF00GLP_R_20213550000_01D_30S_MO.rnx");

        let store = MetaStore::default();
        let overrides = Overrides::default();
        let catalog = NineCharCatalog::default();
        let out = root.join("out");
        let mut ctx = context(&store, &overrides, &catalog, &out);
        ctx.relative = Some("archive");

        let report = transform(&input, &ctx);
        let produced = report.output.unwrap();
        assert!(produced.starts_with(out.join("2021").join("355")));

        // an anchor absent from the input path cannot be reconstructed
        ctx.relative = Some("elsewhere");
        let report = transform(&input, &ctx);
        assert_eq!(report.status.unwrap_err(), FileError::UnreconstructablePath);
    }

    #[test]
    fn short_convention_and_input_removal() {
        let root = scratch("short");
        let input_dir = root.join("in");
        std::fs::create_dir_all(&input_dir).unwrap();
        let input = write_daily_input(&input_dir, "abmf3550.21o");

        let store = MetaStore::default();
        let overrides = Overrides::default();
        let catalog = NineCharCatalog::default();
        let out = root.join("out");
        let mut ctx = context(&store, &overrides, &catalog, &out);
        ctx.remove_input = true;

        let report = transform(&input, &ctx);
        assert!(report.status.is_ok(), "{:?}", report.status);
        let produced = report.output.unwrap();
        // short input stays short, plain input stays plain
        assert_eq!(
            produced.file_name().unwrap().to_str().unwrap(),
            "abmf3550.21o"
        );
        assert!(!input.exists());
    }
}
