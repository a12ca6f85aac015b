use std::path::PathBuf;

use clap::{value_parser, ArgAction::*};

use crate::app::*;

// subcommands
const HASH_CMD: &str = "hash";
const MATCH_CMD: &str = "match";

// file specification
const FILE_PATHS: &str = "Video files to hash";
const PATH_A: &str = "First video";
const PATH_B: &str = "Second video";

//hashing configuration
const FPS: &str = "Sampling rate";
const ALGORITHM: &str = "Hash algorithm";
const HASH_SIZE: &str = "Hash size";
const VIDEO_SIZE: &str = "Video size";

//match configuration
const POLICY: &str = "Match policy";
const HAMMING_DIST: &str = "Hamming distance";
const OVERLAP: &str = "Required overlap";
const KEEP_BLANK: &str = "Keep blank frames";

//output settings
const OUTPUT_FORMAT: &str = "Format";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 14] = [
    //
    // file specification
    FILE_PATHS,
    PATH_A,
    PATH_B,
    //
    //matching
    POLICY,
    OVERLAP,
    HAMMING_DIST,
    KEEP_BLANK,
    //
    //hashing
    FPS,
    ALGORITHM,
    HASH_SIZE,
    VIDEO_SIZE,
    //
    //outputs
    OUTPUT_FORMAT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

fn get_ordering(arg_name: &str) -> usize {
    match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
        Some(idx) => idx,
        None => {
            panic!("argument not assigned a display order: {arg_name:?}");
        }
    }
}

// Arguments which control how videos are hashed, shared by every subcommand.
fn hash_args() -> Vec<clap::Arg> {
    vec![
        clap::Arg::new(FPS)
            .long("fps")
            .num_args(1)
            .value_parser(value_parser!(f64))
            .default_value("5")
            .help("Number of frames sampled from each second of video.")
            .display_order(get_ordering(FPS)),
        clap::Arg::new(ALGORITHM)
            .long("algorithm")
            .num_args(1)
            .value_parser(value_parser!(AlgorithmArg))
            .default_value("dhash")
            .help("The perceptual hash used for each frame. dhash compares neighbouring pixels, phash compares low frequency DCT components")
            .display_order(get_ordering(ALGORITHM)),
        clap::Arg::new(HASH_SIZE)
            .long("hash-size")
            .num_args(1)
            .value_parser(value_parser!(u32).range(2..=64))
            .default_value("8")
            .help("Width and height of each frame hash in bits. Each frame hash holds hash-size squared bits.")
            .display_order(get_ordering(HASH_SIZE)),
        clap::Arg::new(VIDEO_SIZE)
            .long("video-size")
            .num_args(1)
            .value_parser(value_parser!(u32).range(2..))
            .help("Downscale frames so that neither dimension exceeds this many pixels before hashing. Defaults to 25 times the hash size.")
            .display_order(get_ordering(VIDEO_SIZE)),
        clap::Arg::new(OUTPUT_FORMAT)
            .long("output-format")
            .help("Whether to output as normal text , or JSON.")
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .num_args(1)
            .display_order(get_ordering(OUTPUT_FORMAT)),
    ]
}

fn build_app() -> clap::Command {
    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut hash_cmd = clap::Command::new(HASH_CMD)
        .about("Print the fingerprint of each video")
        .args(hash_args());

    hash_cmd = hash_cmd.arg(
        clap::Arg::new(FILE_PATHS)
            .required(true)
            .num_args(1..)
            .value_parser(value_parser!(PathBuf))
            .action(Append)
            .help("Paths to video files")
            .display_order(get_ordering(FILE_PATHS)),
    );

    let mut match_cmd = clap::Command::new(MATCH_CMD)
        .about("Decide whether two videos share content")
        .args(hash_args());

    match_cmd = match_cmd.arg(
        clap::Arg::new(PATH_A)
            .required(true)
            .index(1)
            .value_parser(value_parser!(PathBuf))
            .display_order(get_ordering(PATH_A)),
    );

    match_cmd = match_cmd.arg(
        clap::Arg::new(PATH_B)
            .required(true)
            .index(2)
            .value_parser(value_parser!(PathBuf))
            .display_order(get_ordering(PATH_B)),
    );

    match_cmd = match_cmd.arg(
        clap::Arg::new(POLICY)
            .long("policy")
            .num_args(1)
            .value_parser(value_parser!(PolicyArg))
            .default_value("percentage")
            .help("percentage and frame-count look for shared frames in any order. duration looks for a single shared scene.")
            .display_order(get_ordering(POLICY)),
    );

    match_cmd = match_cmd.arg(
        clap::Arg::new(OVERLAP)
            .long("overlap")
            .num_args(1)
            .value_parser(value_parser!(f64))
            .help("How much content must be shared. A percentage of frames (default 30), a number of frames (default 3), or a number of seconds (default 3), depending on the policy.")
            .display_order(get_ordering(OVERLAP)),
    );

    match_cmd = match_cmd.arg(
        clap::Arg::new(HAMMING_DIST)
            .long("hamming-dist")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .default_value("3")
            .help("Two frames are considered the same if their hashes differ by at most this many bits.")
            .display_order(get_ordering(HAMMING_DIST)),
    );

    match_cmd = match_cmd.arg(
        clap::Arg::new(KEEP_BLANK)
            .long("keep-blank")
            .help("Count black frames towards the overlap. Ignored by the duration policy.")
            .action(SetTrue)
            .display_order(get_ordering(KEEP_BLANK)),
    );

    let mut clap_app = clap::Command::new("vidhash")
        .version(clap::crate_version!())
        .about("Fingerprint video files and detect shared scenes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(hash_cmd)
        .subcommand(match_cmd);

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .global(true)
            .help("Reduced verbosity")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .global(true)
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    let args = build_app().get_matches();
    cfg_from_matches(&args).unwrap_or_else(|e| print_error_and_quit(eyre::Report::new(e)))
}

fn cfg_from_matches(args: &clap::ArgMatches) -> Result<AppCfg, AppError> {
    let (cmd_name, sub_args) = args
        .subcommand()
        .ok_or_else(|| AppError::InvalidArg("no command given".to_string()))?;

    let verbosity = if sub_args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if sub_args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let hash_cfg = HashCfg {
        fps: *sub_args
            .get_one::<f64>(FPS)
            .expect("This argument has a default value"),
        algorithm: *sub_args
            .get_one::<AlgorithmArg>(ALGORITHM)
            .expect("This argument has a default value"),
        hash_size: *sub_args
            .get_one::<u32>(HASH_SIZE)
            .expect("This argument has a default value"),
        video_size: sub_args.get_one::<u32>(VIDEO_SIZE).copied(),
    };

    let output_format = *sub_args
        .get_one::<OutputFormat>(OUTPUT_FORMAT)
        .expect("This argument has a default value");

    let command = match cmd_name {
        HASH_CMD => Command::Hash {
            files: sub_args
                .get_many::<PathBuf>(FILE_PATHS)
                .map(|paths| paths.cloned().collect())
                .unwrap_or_default(),
        },
        MATCH_CMD => {
            let get_path = |arg_name: &str| {
                sub_args
                    .get_one::<PathBuf>(arg_name)
                    .cloned()
                    .ok_or_else(|| AppError::InvalidArg(format!("missing argument: {arg_name}")))
            };

            let match_cfg = MatchCfg {
                policy: *sub_args
                    .get_one::<PolicyArg>(POLICY)
                    .expect("This argument has a default value"),
                hamming_dist: *sub_args
                    .get_one::<u32>(HAMMING_DIST)
                    .expect("This argument has a default value"),
                overlap: sub_args.get_one::<f64>(OVERLAP).copied(),
                keep_blank: sub_args.get_flag(KEEP_BLANK),
            };

            Command::Match {
                path_a: get_path(PATH_A)?,
                path_b: get_path(PATH_B)?,
                match_cfg,
            }
        }
        other => return Err(AppError::InvalidArg(format!("unknown command: {other}"))),
    };

    let ret = AppCfg {
        command,
        hash_cfg,
        output_format,
        verbosity,
    };

    Ok(ret)
}
