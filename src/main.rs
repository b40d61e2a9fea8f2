use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

use rinexmod::batch;
use rinexmod::cli::{gather_inputs, Cli};
use rinexmod::fops::TransformContext;
use rinexmod::meta::ResolverPolicy;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let inputs = gather_inputs(&cli.inputs);
    if inputs.is_empty() {
        error!("no input observation file found");
        std::process::exit(2);
    }

    let settings = match cli.into_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        },
    };

    let ctx = TransformContext {
        store: &settings.store,
        overrides: &settings.overrides,
        policy: ResolverPolicy {
            force: settings.force,
            ignore_firmware: settings.ignore_firmware,
        },
        precision: settings.precision,
        convention: settings.convention,
        catalog: &settings.catalog,
        country: settings.country.as_deref(),
        marker: settings.marker.as_ref(),
        output: &settings.output,
        relative: settings.relative.as_deref(),
        compression: settings.compression,
        remove_input: settings.remove,
        full_history: settings.full_history,
    };

    let summary = batch::run(&inputs, &ctx);
    summary.log_results();

    if let Some(dir) = &settings.lists {
        match summary.write_lists(dir) {
            Ok(written) => {
                for list in written {
                    log::info!("list written: {}", list.display());
                }
            },
            Err(e) => error!("could not write product lists: {}", e),
        }
    }

    log::info!(
        "{} file(s) processed, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    if summary.failed() > 0 {
        std::process::exit(1);
    }
}
