use clap::{Arg, ArgAction, ArgMatches, Command};
use fxhash::FxHashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use libspill_display::config::Config;
use libspill_display::error::ProcessorError;
use libspill_display::extractor::DumpFileSource;
use libspill_display::file_locator::{next_free_path, read_file_list};
use libspill_display::process::{filter_files, generate_displays, locate_run, match_records};
use libspill_display::summary::RunSummary;
use libspill_display::worker_status::{Stage, WorkerStatus};

const LOG_PATH: &str = "./spill_display.log";

fn log_formatter() -> Box<dyn spdlog::formatter::Formatter> {
    Box::new(spdlog::formatter::PatternFormatter::new(spdlog::formatter::pattern!(
        "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
    )))
}

/// Terminal filter for a `-v` count: errors and warnings, then info, then everything
fn terminal_filter(verbosity: u8) -> spdlog::LevelFilter {
    match verbosity {
        0 => spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Warn),
        1 => spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Info),
        _ => spdlog::LevelFilter::All,
    }
}

/// Log to a file and to stdout. The file gets everything, stdout follows the verbosity.
fn setup_logging(verbosity: u8) -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_PATH))
            .formatter(log_formatter())
            .truncate(true)
            .build()?,
    );
    let terminal_sink = Arc::new(
        spdlog::sink::StdStreamSink::builder()
            .std_stream(spdlog::sink::StdStream::Stdout)
            .formatter(log_formatter())
            .level_filter(terminal_filter(verbosity))
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .level_filter(spdlog::LevelFilter::All)
            .flush_level_filter(spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Warn))
            .sink(file_sink)
            .sink(terminal_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn make_template_config(path: &Path) {
    match Config::default().write_config_file(path) {
        Ok(()) => spdlog::info!("Done."),
        Err(e) => spdlog::error!("Could not write template config: {e}"),
    }
}

/// Draw one bar per worker until every worker has hung up, then collect the result
fn follow_progress(
    rx: Receiver<WorkerStatus>,
    handle: JoinHandle<Result<RunSummary, ProcessorError>>,
) -> Option<RunSummary> {
    let pb_manager = MultiProgress::new();
    let style = ProgressStyle::with_template("[worker {prefix}] {bar:40} {pos}/{len} files {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let mut bars: FxHashMap<usize, ProgressBar> = FxHashMap::default();

    loop {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(status) => {
                let bar = bars.entry(status.worker_id).or_insert_with(|| {
                    let bar = pb_manager.add(ProgressBar::new(status.files_total as u64));
                    bar.set_style(style.clone());
                    bar.set_prefix(status.worker_id.to_string());
                    bar
                });
                bar.set_length(status.files_total as u64);
                bar.set_position(status.files_done as u64);
                match status.stage {
                    Stage::Filtering => bar.set_message("filtering"),
                    Stage::Rendering => bar.set_message("rendering"),
                    Stage::Finished => bar.finish_with_message("done"),
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for bar in bars.values() {
        if !bar.is_finished() {
            bar.abandon();
        }
    }

    match handle.join() {
        Ok(Ok(summary)) => Some(summary),
        Ok(Err(e)) => {
            spdlog::error!("Processing failed with error: {e}");
            None
        }
        Err(_) => {
            spdlog::error!("Failed to join processing task!");
            None
        }
    }
}

fn required_path(matches: &ArgMatches, name: &str) -> PathBuf {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .unwrap_or_default()
}

fn load_file_list(path: &Path) -> Option<Vec<PathBuf>> {
    match read_file_list(path) {
        Ok(files) => {
            spdlog::info!("Read {} file paths from {}", files.len(), path.display());
            Some(files)
        }
        Err(e) => {
            spdlog::error!("{e}");
            None
        }
    }
}

fn run_locate(config: &Config, matches: &ArgMatches) {
    let Some(run_number) = matches.get_one::<u32>("run").copied() else {
        return;
    };
    let output = next_free_path(&required_path(matches, "output"));
    if let Err(e) = locate_run(config, run_number, &output) {
        spdlog::error!("Locating run {run_number} failed: {e}");
    }
}

fn run_filter(config: Config, matches: &ArgMatches) {
    let Some(files) = load_file_list(&required_path(matches, "files")) else {
        return;
    };
    let output = next_free_path(&required_path(matches, "output"));
    spdlog::info!("Writing filtered records to {}", output.display());

    let (tx, rx) = channel();
    let handle = std::thread::spawn(move || filter_files(&config, &files, &DumpFileSource, &output, &tx));
    if let Some(summary) = follow_progress(rx, handle) {
        spdlog::info!("Filtering finished -- {summary}");
    }
}

fn run_match(config: &Config, matches: &ArgMatches) {
    let spill = required_path(matches, "spill");
    let records = required_path(matches, "records");
    let output = next_free_path(&required_path(matches, "output"));
    match match_records(config, &spill, &records, Some(&output)) {
        Ok((matched, summary)) => {
            if matched.out_of_range > 0 {
                spdlog::warn!(
                    "{} records were outside the beam export time range; check the time base offset",
                    matched.out_of_range
                );
            }
            spdlog::info!("Matching finished -- {summary}");
        }
        Err(e) => spdlog::error!("Matching failed: {e}"),
    }
}

fn run_display(config: Config, matches: &ArgMatches, overwrite: bool) {
    let Some(files) = load_file_list(&required_path(matches, "files")) else {
        return;
    };
    let spill = required_path(matches, "spill");
    let records = required_path(matches, "records");
    let output_dir = required_path(matches, "output");

    let (tx, rx) = channel();
    let handle = std::thread::spawn(move || {
        generate_displays(&config, &files, &spill, &records, &output_dir, overwrite, tx)
    });
    if let Some(summary) = follow_progress(rx, handle) {
        spdlog::info!("Displays finished -- {summary}");
        if summary.render_failed > 0 {
            spdlog::warn!("Some displays could not be written, check the log file at {LOG_PATH}");
        }
    }
}

fn path_arg(name: &'static str, short: char, help: &'static str) -> Arg {
    Arg::new(name)
        .short(short)
        .long(name)
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .help(help)
}

fn output_arg(default: &'static str, help: &'static str) -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .default_value(default)
        .value_parser(clap::value_parser!(PathBuf))
        .help(help)
}

fn main() {
    // Create a cli
    let matches = Command::new("spill_display_cli")
        .about("Separate spill ON and OFF trigger records and draw event displays")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .default_value("config.yml")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Terminal verbosity: errors and warnings by default, -v adds info, -vv everything"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Replace existing displays instead of adding a numbered copy"),
        )
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("locate")
                .about("Find the raw files of a run and write them to a file list")
                .arg(
                    Arg::new("run")
                        .short('r')
                        .long("run")
                        .required(true)
                        .value_parser(clap::value_parser!(u32))
                        .help("Run number"),
                )
                .arg(output_arg("files.txt", "File list to write")),
        )
        .subcommand(
            Command::new("filter")
                .about("Extract the records of the configured trigger type into a table")
                .arg(path_arg("files", 'f', "File list of raw dumps"))
                .arg(output_arg("output.csv", "Record table to write")),
        )
        .subcommand(
            Command::new("match")
                .about("Label every record of a table spill ON or OFF")
                .arg(path_arg("spill", 's', "Beam export CSV"))
                .arg(path_arg("records", 'r', "Record table written by filter"))
                .arg(output_arg("labeled.csv", "Labelled table to write")),
        )
        .subcommand(
            Command::new("display")
                .about("Render the event display of every spill ON record")
                .arg(path_arg("files", 'f', "File list of raw dumps"))
                .arg(path_arg("spill", 's', "Beam export CSV"))
                .arg(path_arg("records", 'r', "Record table written by filter"))
                .arg(output_arg(".", "Directory for the displays")),
        )
        .get_matches();

    // Initialize feedback
    let verbosity = matches.get_count("verbose");
    if let Err(e) = setup_logging(verbosity) {
        eprintln!("Could not create logging: {e}");
        return;
    }

    let config_path = required_path(&matches, "config");
    let overwrite = matches.get_flag("overwrite");

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!("Making a template config at {}...", config_path.display());
        make_template_config(&config_path);
        return;
    }

    // Load our config
    spdlog::info!("Loading config from {}...", config_path.display());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("Raw data path: {}", config.raw_data_path.display());
    spdlog::info!(
        "Trigger type: {} Tick: {} ns Spill duration: {} ms Time base offset: {} ms",
        config.trigger_type,
        config.tick_ns,
        config.spill_duration_ms,
        config.time_base_offset_ms
    );
    spdlog::info!("Renderer: {:?} Workers: {}", config.renderer, config.n_threads);

    match matches.subcommand() {
        Some(("locate", sub)) => run_locate(&config, sub),
        Some(("filter", sub)) => run_filter(config, sub),
        Some(("match", sub)) => run_match(&config, sub),
        Some(("display", sub)) => run_display(config, sub, overwrite),
        _ => spdlog::error!("No command given, see --help"),
    }

    spdlog::info!("Done.");
}
