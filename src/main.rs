// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Result;
use clap::{Parser, Subcommand, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error};

use subferry::app_config::{LogLevel, Settings};
use subferry::app_controller::{BatchSummary, Controller};

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "subferry",
    about = "Ferry oversized SRT subtitle files through an external translation step and back, intact",
    version
)]
struct CommandLineOptions {
    /// Root directory holding the origin/origin_chunks/working_chunks/merged
    /// roles (ignored when --config is given)
    #[arg(short = 'r', long, global = true)]
    root: Option<PathBuf>,

    /// Settings file (JSON) overriding --root
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split full SRT files into bounded chunks in the origin and working
    /// chunk directories
    Split {
        /// One file to split; default is every SRT file in the origin
        /// directory
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum caption blocks per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Strip translation-tool noise from returned working chunks and
    /// reconcile their headers against the held originals
    Restore {
        /// One chunk file name to restore (e.g. name.ja_000.srt); default is
        /// every chunk
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Merge restored chunks back into one file per base
    Merge {
        /// One base identifier to merge; default is every base
        #[arg(short, long)]
        base: Option<String>,
    },

    /// Compare merged results against their originals
    Compare {
        /// One base identifier to compare; default is every base
        #[arg(short, long)]
        base: Option<String>,

        /// On PASS, move the merged file next to its media file under this
        /// directory and delete the base's intermediates
        #[arg(long)]
        relocate_target: Option<PathBuf>,
    },

    /// Normalize finished subtitle files: sentence-final punctuation, line
    /// wrapping and minimum display durations
    PostProcess {
        /// One file to post-process; default is every SRT file in the origin
        /// directory
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output directory; default is in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Collapse degenerate repeated tokens in SRT files, preserving each
    /// file's byte encoding
    TrimRepeats {
        /// Directory to process recursively; default is the origin directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Pattern file, one literal per line; default is the configured one
        #[arg(short, long)]
        patterns: Option<PathBuf>,

        /// Minimum run length that triggers compression
        #[arg(short = 'm', long)]
        min: Option<usize>,

        /// Occurrences kept when a run is compressed
        #[arg(short = 'k', long)]
        keep: Option<usize>,

        /// Join kept occurrences with a single space
        #[arg(long)]
        keep_space: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions for subferry
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The effective level changes after init, once the settings and CLI
        // flags are loaded; consult the global filter rather than a level
        // frozen at construction
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let color = match record.level() {
                Level::Error => "\x1B[1;31m",
                Level::Warn => "\x1B[1;33m",
                Level::Info => "\x1B[1;32m",
                Level::Debug => "\x1B[1;36m",
                Level::Trace => "\x1B[1;35m",
            };
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter_from_settings(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

fn load_settings(cli: &CommandLineOptions) -> Result<Settings> {
    if let Some(config_path) = &cli.config {
        return Settings::from_file(config_path);
    }
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("srt_home"));
    Ok(Settings::with_root(root))
}

fn exit_code_for(summary: &BatchSummary) -> ExitCode {
    if summary.all_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(cli: CommandLineOptions) -> Result<ExitCode> {
    let mut settings = load_settings(&cli)?;

    // CLI log level wins over settings
    let level = cli
        .log_level
        .clone()
        .map(LevelFilter::from)
        .unwrap_or_else(|| level_filter_from_settings(&settings.log_level));
    log::set_max_level(level);

    match cli.command {
        Commands::Split { file, chunk_size } => {
            if let Some(size) = chunk_size {
                settings.chunk_size = size;
            }
            let controller = Controller::with_settings(settings)?;
            match file {
                Some(path) => {
                    let chunks = controller.split_one(&path)?;
                    println!("Wrote {} chunk(s) for {}", chunks, path.display());
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    let summary = controller.split_all()?;
                    println!("split: {}", summary);
                    Ok(exit_code_for(&summary))
                }
            }
        }
        Commands::Restore { file } => {
            let controller = Controller::with_settings(settings)?;
            match file {
                Some(name) => {
                    controller.restore_one(&name)?;
                    println!("Restored {}", name);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    let summary = controller.restore_all()?;
                    println!("restore: {}", summary);
                    Ok(exit_code_for(&summary))
                }
            }
        }
        Commands::Merge { base } => {
            let controller = Controller::with_settings(settings)?;
            match base {
                Some(base) => {
                    let path = controller.merge_one(&base)?;
                    println!("Merged base '{}' into {}", base, path.display());
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    let summary = controller.merge_all()?;
                    println!("merge: {}", summary);
                    Ok(exit_code_for(&summary))
                }
            }
        }
        Commands::Compare { base, relocate_target } => {
            let controller = Controller::with_settings(settings)?;
            match base {
                Some(base) => {
                    let verdict = controller.compare_one(&base)?;
                    println!("{}", verdict);
                    Ok(if verdict.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
                }
                None => {
                    let summary = controller.compare_all(relocate_target.as_deref())?;
                    println!("compare: {}", summary);
                    Ok(exit_code_for(&summary))
                }
            }
        }
        Commands::PostProcess { file, output } => {
            let controller = Controller::with_settings(settings)?;
            match file {
                Some(path) => {
                    let blocks = controller.post_process_one(&path, output.as_deref())?;
                    println!("Post-processed {} ({} blocks)", path.display(), blocks);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    let summary = controller.post_process_all(output.as_deref())?;
                    println!("post-process: {}", summary);
                    Ok(exit_code_for(&summary))
                }
            }
        }
        Commands::TrimRepeats { dir, patterns, min, keep, keep_space, dry_run } => {
            if let Some(min) = min {
                settings.min_repeat = min;
            }
            if let Some(keep) = keep {
                settings.keep_repeat = keep;
            }
            if keep_space {
                settings.keep_space = true;
            }
            let controller = Controller::with_settings(settings)?;
            let summary =
                controller.trim_repeats_all(dir.as_deref(), patterns.as_deref(), dry_run)?;
            println!("trim-repeats: {}", summary);
            Ok(exit_code_for(&summary))
        }
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    // Initialize the logger once with info level by default; the level is
    // raised or lowered after the settings are loaded
    if CustomLogger::init(LevelFilter::Info).is_err() {
        eprintln!("Failed to initialize logger");
        return ExitCode::FAILURE;
    }

    let cli = CommandLineOptions::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
