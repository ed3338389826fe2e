//! # taurus_merger_cli
//!
//! Part of the taurus_merger crate family.
//!
//! Command line front end for regrouping Taurus miniSEED files (one file per channel) into
//! Centaur miniSEED files (one file per station).
//!
//! ## Use
//!
//! Either give the directories on the command line
//!
//! ```bash
//! taurus_merger_cli -i /data/taurus -o /data/centaur -c ZNE
//! ```
//!
//! or write a template configuration and point the merger at it
//!
//! ```bash
//! taurus_merger_cli -p config.yml new
//! taurus_merger_cli -p config.yml
//! ```
//!
//! Options given on the command line override the configuration file.
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::path::PathBuf;

use libtaurus_merger::config::Config;
use libtaurus_merger::error::ConfigError;
use libtaurus_merger::mseed::MseedCodec;
use libtaurus_merger::process::process;
use libtaurus_merger::worker_status::WorkerStatus;

const LOG_FILE_NAME: &str = "taurus_merger.log";

fn build_cli() -> Command {
    Command::new("taurus_merger_cli")
        .about("Regroup Taurus miniSEED files (file per channel) into Centaur files (file per station)")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("Directory containing the input subdirectories. Must exist."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Directory where merged files are written. Created if necessary."),
        )
        .arg(
            Arg::new("channel_order")
                .short('c')
                .long("channel-order")
                .help("Order of the channels in the output, e.g. ZNE. Default is discovery order."),
        )
        .arg(
            Arg::new("structured")
                .short('s')
                .long("structured")
                .action(ArgAction::SetTrue)
                .help("Write output to <output>/<year>/<month>/<day>/"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only print warnings, errors, and the final statistics"),
        )
        .arg(
            Arg::new("reference_rate")
                .short('r')
                .long("reference-rate")
                .value_parser(value_parser!(f64))
                .help("Sample rate in Hz used to express gap sizes in samples"),
        )
        .arg(
            Arg::new("skip_malformed")
                .long("skip-malformed")
                .action(ArgAction::SetTrue)
                .help("Skip badly named files with a warning instead of stopping"),
        )
}

/// Load the config file (if any) and apply the command line overrides on top of it
fn build_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
    let from_file = matches.get_one::<String>("path");
    let mut config = match from_file {
        Some(path) => Config::read_config_file(&PathBuf::from(path))?,
        None => Config::default(),
    };

    match matches.get_one::<String>("input") {
        Some(input) => config.input_path = PathBuf::from(input),
        None if from_file.is_none() => return Err(ConfigError::MissingPath(String::from("input"))),
        None => (),
    }
    match matches.get_one::<String>("output") {
        Some(output) => config.output_path = PathBuf::from(output),
        None if from_file.is_none() => {
            return Err(ConfigError::MissingPath(String::from("output")))
        }
        None => (),
    }
    if let Some(order) = matches.get_one::<String>("channel_order") {
        config.channel_order = Some(order.clone());
    }
    if let Some(rate) = matches.get_one::<f64>("reference_rate") {
        config.reference_rate = *rate;
    }
    if matches.get_flag("structured") {
        config.structured_output = true;
    }
    if matches.get_flag("quiet") {
        config.verbose = false;
    }
    if matches.get_flag("skip_malformed") {
        config.skip_malformed = true;
    }
    Ok(config)
}

fn main() {
    let matches = build_cli().get_matches();

    if let Some(("new", _)) = matches.subcommand() {
        let Some(path) = matches.get_one::<String>("path") else {
            eprintln!("Making a template config requires a path (-p)");
            std::process::exit(1);
        };
        println!("Making a template config at {path}...");
        match Config::default().write_config_file(&PathBuf::from(path)) {
            Ok(()) => println!("Done."),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let config = build_config(&matches);
    let verbose = config.as_ref().map(|c| c.verbose).unwrap_or(true);

    // Initialize feedback
    let term_level = if verbose {
        simplelog::LevelFilter::Info
    } else {
        simplelog::LevelFilter::Warn
    };
    let logger = simplelog::CombinedLogger::new(vec![
        simplelog::TermLogger::new(
            term_level,
            simplelog::Config::default(),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        ),
        simplelog::WriteLogger::new(
            simplelog::LevelFilter::Info,
            simplelog::Config::default(),
            File::create(LOG_FILE_NAME).expect("Could not create the log file!"),
        ),
    ]);

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Input Path: {}", config.input_path.to_string_lossy());
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!(
        "Channel Order: {}",
        config.channel_order.as_deref().unwrap_or("discovery order")
    );
    log::info!("Structured Output: {}", config.structured_output);
    log::info!("Reference Rate: {} Hz", config.reference_rate);

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let (tx, rx) = std::sync::mpsc::channel::<WorkerStatus>();
    // Spawn the task! The sender moves into the worker, so the receiver closes when it is done
    let handle = std::thread::spawn(move || process(&config, &MseedCodec::new(), &tx));

    for status in rx.iter() {
        pb.set_position((status.progress * 100.0) as u64);
        if !status.directory.is_empty() {
            pb.set_message(format!(
                "{}: {} files",
                status.directory, status.files_written
            ));
        }
    }
    pb.finish();

    match handle.join() {
        Ok(Ok(stats)) => {
            log::info!("Successfully merged data!");
            println!("{stats}");
        }
        Ok(Err(e)) => {
            log::error!("Merging failed with error: {e}");
            log::error!("Files written before the failure were kept.");
            std::process::exit(1);
        }
        Err(_) => {
            log::error!("Failed to join merging task!");
            std::process::exit(1);
        }
    }

    log::info!("Done.");
}
