use std::{error::Error, path::PathBuf};

#[cfg(feature = "parallel_loading")]
use rayon::prelude::*;
use vidhash::HashOptions;

use crate::app::*;

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.verbosity);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let hash_options = cfg.hash_cfg.hash_options()?;

    if !vidhash::ffmpeg_and_ffprobe_are_callable() {
        return Err(AppError::FfmpegNotFound.into());
    }

    match &cfg.command {
        Command::Hash { files } => hash_files(files, &hash_options, cfg.output_format)?,

        Command::Match {
            path_a,
            path_b,
            match_cfg,
        } => {
            let match_options = match_cfg.match_options()?;
            let is_match = vidhash::check_match(path_a, path_b, &hash_options, &match_options)
                .map_err(AppError::from)?;

            MatchOutput::new(path_a, path_b, match_options, is_match).print(cfg.output_format);
        }
    }

    Ok(())
}

// Hash every file, and print the hashes that succeeded before reporting any failures.
fn hash_files(
    files: &[PathBuf],
    hash_options: &HashOptions,
    format: OutputFormat,
) -> Result<(), AppError> {
    let hash_one = |path: &PathBuf| (path.clone(), vidhash::hash_video(path, hash_options));

    #[cfg(feature = "parallel_loading")]
    let results = files.par_iter().map(hash_one).collect::<Vec<_>>();

    #[cfg(not(feature = "parallel_loading"))]
    let results = files.iter().map(hash_one).collect::<Vec<_>>();

    let mut hashes = vec![];
    let mut errors = vec![];
    for (path, result) in results {
        match result {
            Ok(hash) => hashes.push((path, hash)),
            Err(e) => errors.push(e),
        }
    }

    HashOutput::new(hashes).print(format);

    if errors.is_empty() {
        return Ok(());
    }

    //with only one video there is nothing to summarize.
    if files.len() == 1 {
        if let Some(e) = errors.pop() {
            return Err(e.into());
        }
    }

    for e in &errors {
        error!(target: "app-errorlog", "{}", e);
    }
    Err(AppError::SomeHashesFailed(errors.len(), files.len()))
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    cfg.set_time_level(LevelFilter::Off);

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        cfg.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}
